use crate::data::anomaly::detect_duration_anomalies;
use crate::data::{
    DashboardSeries, FilterCriteria, TripRecord, TripStats, build_series, compute_stats,
    filter_records, load_records,
};
use crate::error::{DashboardError, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Todo lo que necesita la capa de presentación en un solo documento.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub criteria: FilterCriteria,
    pub stats: TripStats,
    pub series: DashboardSeries,
    pub anomalies: Vec<usize>,
}

/// Estado de una sesión del tablero.
///
/// La colección cargada no se modifica nunca; cada filtro produce una vista
/// nueva que reemplaza a la anterior.
#[derive(Debug, Clone, Default)]
pub struct DashboardSession {
    records: Vec<TripRecord>,
    criteria: FilterCriteria,
    filtered: Vec<TripRecord>,
}

impl DashboardSession {
    pub fn new(records: Vec<TripRecord>) -> Self {
        let filtered = records.clone();
        Self {
            records,
            criteria: FilterCriteria::default(),
            filtered,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records = load_records(&path)?;
        if records.is_empty() {
            warn!(path = %path.as_ref().display(), "no hay viajes para mostrar");
        }
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[TripRecord] {
        &self.records
    }

    pub fn filtered(&self) -> &[TripRecord] {
        &self.filtered
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `NoData` si la colección cargada desde `source` está vacía.
    pub fn ensure_data(&self, source: &str) -> Result<()> {
        if self.is_empty() {
            return Err(DashboardError::NoData(source.to_string()));
        }
        Ok(())
    }

    pub fn apply_filters(&mut self, criteria: FilterCriteria) -> &[TripRecord] {
        self.filtered = filter_records(&self.records, &criteria);
        info!(
            total = self.records.len(),
            filtered = self.filtered.len(),
            "filtros aplicados"
        );
        self.criteria = criteria;
        &self.filtered
    }

    pub fn clear_filters(&mut self) -> &[TripRecord] {
        self.apply_filters(FilterCriteria::default())
    }

    /// Primeros `limit` viajes de la vista actual.
    pub fn trips(&self, limit: usize) -> &[TripRecord] {
        &self.filtered[..limit.min(self.filtered.len())]
    }

    pub fn stats(&self) -> TripStats {
        compute_stats(&self.filtered)
    }

    pub fn series(&self) -> DashboardSeries {
        build_series(&self.filtered)
    }

    /// Índices dentro de `filtered()` de los viajes con duración atípica.
    pub fn anomalies(&self) -> Vec<usize> {
        detect_duration_anomalies(&self.filtered)
    }

    pub fn report(&self) -> DashboardReport {
        DashboardReport {
            criteria: self.criteria.clone(),
            stats: self.stats(),
            series: self.series(),
            anomalies: self.anomalies(),
        }
    }
}
