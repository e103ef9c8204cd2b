use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use taxi_dashboard::config::DashboardConfig;
use taxi_dashboard::data::cleaning::clean_file;
use taxi_dashboard::data::{FilterCriteria, TripStats, write_records};
use taxi_dashboard::logging::{LogFormat, init_logging};
use taxi_dashboard::{DashboardError, DashboardSession};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "taxi_dashboard",
    version,
    about = "Estadísticas y series de viajes de taxi para el tablero"
)]
struct Cli {
    /// Formato de logs: pretty o json (por defecto LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct DataArgs {
    /// CSV de viajes limpios (por defecto TRIPS_CSV)
    #[arg(long)]
    data: Option<String>,

    /// Fecha mínima de recogida, YYYY-MM-DD
    #[arg(long)]
    start_date: Option<String>,

    /// Fecha máxima de recogida, YYYY-MM-DD
    #[arg(long)]
    end_date: Option<String>,

    #[arg(long)]
    vendor_id: Option<String>,

    #[arg(long)]
    passenger_count: Option<String>,
}

impl DataArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            vendor_id: self.vendor_id.clone(),
            passenger_count: self.passenger_count.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tarjetas con las seis estadísticas
    Stats {
        #[command(flatten)]
        data: DataArgs,

        /// Salida en JSON
        #[arg(long)]
        json: bool,
    },

    /// Series para los gráficos (JSON)
    Series {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Estadísticas, series y anomalías en un solo JSON
    Dashboard {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Lista los viajes filtrados o los exporta a CSV
    Trips {
        #[command(flatten)]
        data: DataArgs,

        /// Máximo de viajes a listar (por defecto TRIPS_LIMIT)
        #[arg(long)]
        limit: Option<usize>,

        /// Exporta todos los viajes filtrados a este CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Índices de viajes con duración atípica (IQR)
    Anomalies {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Limpia el CSV crudo y calcula distancia, velocidad y tarifa
    Clean {
        input: PathBuf,
        output: PathBuf,

        /// Procesar sólo las primeras N filas (por defecto CLEAN_LIMIT)
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Carga y filtra. `None` si no hay datos que mostrar.
///
/// Los avisos van a stderr: stdout queda reservado para el JSON.
fn open_session(cfg: &DashboardConfig, args: &DataArgs) -> Result<Option<DashboardSession>> {
    let criteria = args.criteria();
    criteria.validate()?;

    let path = args.data.as_deref().unwrap_or(&cfg.data_path);
    let mut session = DashboardSession::from_path(path)
        .with_context(|| format!("No se pudo leer el archivo de viajes {}", path))?;

    match session.ensure_data(path) {
        Ok(()) => {}
        Err(DashboardError::NoData(source)) => {
            eprintln!("No hay datos en {}", source);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }

    session.apply_filters(criteria);
    if session.filtered().is_empty() {
        eprintln!("No se encontraron viajes con esos filtros");
    }
    Ok(Some(session))
}

fn print_cards(stats: &TripStats) {
    println!("  - Total de viajes: {}", stats.total_trips);
    println!("  - Duración promedio: {:.1} s", stats.avg_duration);
    println!("  - Distancia promedio: {:.1} km", stats.avg_distance);
    println!("  - Velocidad promedio: {:.1} km/h", stats.avg_speed);
    println!("  - Tarifa promedio: ${:.2}", stats.avg_fare);
    println!("  - Tarifa total: ${:.2}", stats.total_fare);
}

fn main() -> Result<()> {
    let cfg = DashboardConfig::from_env();
    let cli = Cli::parse();
    init_logging(cli.log_format.unwrap_or(cfg.log_format));

    match cli.command {
        Command::Stats { data, json } => {
            let Some(session) = open_session(&cfg, &data)? else {
                return Ok(());
            };
            let stats = session.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Estadísticas de {} viajes:", stats.total_trips);
                print_cards(&stats);
            }
        }

        Command::Series { data } => {
            let Some(session) = open_session(&cfg, &data)? else {
                return Ok(());
            };
            println!("{}", serde_json::to_string_pretty(&session.series())?);
        }

        Command::Dashboard { data } => {
            let Some(session) = open_session(&cfg, &data)? else {
                return Ok(());
            };
            println!("{}", serde_json::to_string_pretty(&session.report())?);
        }

        Command::Trips {
            data,
            limit,
            output,
        } => {
            let Some(session) = open_session(&cfg, &data)? else {
                return Ok(());
            };
            match output {
                Some(output) => {
                    let count = write_records(&output, session.filtered())
                        .with_context(|| format!("No se pudo escribir {}", output.display()))?;
                    println!("Se exportaron {} viajes a {}", count, output.display());
                }
                None => {
                    let trips = session.trips(limit.unwrap_or(cfg.trips_limit));
                    println!("{}", serde_json::to_string_pretty(trips)?);
                }
            }
        }

        Command::Anomalies { data } => {
            let Some(session) = open_session(&cfg, &data)? else {
                return Ok(());
            };
            let anomalies = session.anomalies();
            info!(count = anomalies.len(), "anomalías detectadas");
            println!("{}", serde_json::to_string(&anomalies)?);
        }

        Command::Clean {
            input,
            output,
            limit,
        } => {
            let start_time = Instant::now();
            println!("Limpiando {}...", input.display());

            let counts = clean_file(&input, &output, limit.or(cfg.clean_limit))
                .with_context(|| format!("No se pudo limpiar {}", input.display()))?;

            println!("Limpieza completada en {:.2?}", start_time.elapsed());
            println!("  - Registros originales: {}", counts.original);
            println!("  - Sin faltantes: {}", counts.after_missing);
            println!("  - Sin duplicados: {}", counts.after_duplicates);
            println!("  - Válidos: {}", counts.after_validity);
            println!("  - Excluidos: {}", counts.excluded);
            println!("Datos limpios guardados en: {}", output.display());
        }
    }

    Ok(())
}
