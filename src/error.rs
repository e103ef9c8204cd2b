use std::io;

use thiserror::Error;

/// Errores de carga, filtrado y exportación de viajes.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("error de CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("error de JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fecha inválida '{value}' en {field}: se espera YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("no hay datos en {0}")]
    NoData(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
