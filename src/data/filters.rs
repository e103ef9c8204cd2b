use super::trip_struct::{FieldValue, TripRecord, normalize_key};
use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Los cuatro criterios del tablero. Un campo vacío no restringe nada.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub passenger_count: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        [
            &self.start_date,
            &self.end_date,
            &self.vendor_id,
            &self.passenger_count,
        ]
        .iter()
        .all(|c| active(c).is_none())
    }

    /// Verifica que las fechas tengan forma `YYYY-MM-DD`.
    ///
    /// El filtro compara texto, así que una fecha mal formada daría
    /// resultados sin sentido en vez de un error.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if let Some(date) = active(value) {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() || date.len() != 10 {
                    return Err(DashboardError::InvalidDate {
                        field,
                        value: date.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Arma el filtro compuesto (AND) con los criterios presentes.
    pub fn to_filter(&self) -> TripFilter {
        let mut filters = Vec::new();

        if let Some(date) = active(&self.start_date) {
            filters.push(TripFilter::DateFrom(date.to_string()));
        }
        if let Some(date) = active(&self.end_date) {
            filters.push(TripFilter::DateTo(date.to_string()));
        }
        if let Some(vendor) = active(&self.vendor_id) {
            filters.push(TripFilter::Vendor(vendor.to_string()));
        }
        if let Some(passengers) = active(&self.passenger_count) {
            filters.push(TripFilter::Passengers(passengers.to_string()));
        }

        // Sin criterios queda un AND vacío, que acepta todo
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            TripFilter::And(filters)
        }
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub enum TripFilter {
    /// Fecha de recogida >= límite (comparación de texto)
    DateFrom(String),
    /// Fecha de recogida <= límite (comparación de texto)
    DateTo(String),
    Vendor(String),
    Passengers(String),
    And(Vec<TripFilter>),
}

impl TripFilter {
    pub fn matches(&self, trip: &TripRecord) -> bool {
        match self {
            // El formato YYYY-MM-DD hace que el orden de texto sea el cronológico
            TripFilter::DateFrom(bound) => trip
                .pickup_date()
                .is_some_and(|date| date >= bound.as_str()),
            TripFilter::DateTo(bound) => trip
                .pickup_date()
                .is_some_and(|date| date <= bound.as_str()),
            TripFilter::Vendor(target) => loose_eq(trip.vendor_id(), target),
            TripFilter::Passengers(target) => loose_eq(trip.passenger_count(), target),
            TripFilter::And(filters) => filters.iter().all(|f| f.matches(trip)),
        }
    }
}

/// Igualdad explícita entre un campo y un criterio textual: ambos se llevan a
/// su clave normalizada, así `"2"` coincide con el número `2`.
pub fn loose_eq(field: Option<&FieldValue>, criterion: &str) -> bool {
    match field {
        Some(value) => value.key() == normalize_key(criterion),
        None => false,
    }
}

/// Devuelve los viajes que cumplen todos los criterios, en el orden original.
pub fn filter_records(records: &[TripRecord], criteria: &FilterCriteria) -> Vec<TripRecord> {
    if criteria.is_empty() {
        return records.to_vec();
    }

    let filter = criteria.to_filter();
    let filtered: Vec<TripRecord> = records
        .iter()
        .filter(|trip| filter.matches(trip))
        .cloned()
        .collect();

    debug!(
        total = records.len(),
        kept = filtered.len(),
        ?criteria,
        "filtro aplicado"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::trip_struct::{PASSENGER_COUNT, PICKUP_DATETIME, VENDOR_ID};

    fn trip(date: &str, vendor: f64, passengers: f64) -> TripRecord {
        TripRecord::new()
            .with(PICKUP_DATETIME, date)
            .with(VENDOR_ID, vendor)
            .with(PASSENGER_COUNT, passengers)
    }

    fn sample() -> Vec<TripRecord> {
        vec![
            trip("2021-01-01 08:00:00", 1.0, 2.0),
            trip("2021-01-02 09:00:00", 2.0, 1.0),
            trip("2021-01-03 23:59:59", 2.0, 2.0),
        ]
    }

    #[test]
    fn empty_criteria_returns_everything() {
        let records = sample();
        assert_eq!(filter_records(&records, &FilterCriteria::default()), records);

        let blank = FilterCriteria {
            vendor_id: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.is_empty());
        assert_eq!(filter_records(&records, &blank), records);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let criteria = FilterCriteria {
            start_date: Some("2021-01-02".into()),
            end_date: Some("2021-01-03".into()),
            ..Default::default()
        };
        let result = filter_records(&sample(), &criteria);
        let dates: Vec<_> = result.iter().filter_map(|r| r.pickup_date()).collect();
        assert_eq!(dates, vec!["2021-01-02", "2021-01-03"]);
    }

    #[test]
    fn vendor_string_matches_numeric_field() {
        let criteria = FilterCriteria {
            vendor_id: Some("2".into()),
            ..Default::default()
        };
        assert_eq!(filter_records(&sample(), &criteria).len(), 2);

        let criteria = FilterCriteria {
            vendor_id: Some("2.0".into()),
            passenger_count: Some("2".into()),
            ..Default::default()
        };
        let result = filter_records(&sample(), &criteria);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].pickup_date(), Some("2021-01-03"));
    }

    #[test]
    fn missing_fields_never_match_active_criteria() {
        let records = vec![TripRecord::new().with(VENDOR_ID, 1.0)];
        let criteria = FilterCriteria {
            start_date: Some("2000-01-01".into()),
            ..Default::default()
        };
        assert!(filter_records(&records, &criteria).is_empty());
    }

    #[test]
    fn single_criterion_is_not_wrapped() {
        let criteria = FilterCriteria {
            vendor_id: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(criteria.to_filter(), TripFilter::Vendor("1".into()));
        assert_eq!(FilterCriteria::default().to_filter(), TripFilter::And(vec![]));
    }

    #[test]
    fn validate_rejects_malformed_dates() {
        let ok = FilterCriteria {
            start_date: Some("2021-01-01".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad = FilterCriteria {
            end_date: Some("01/02/2021".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(DashboardError::InvalidDate { field: "end_date", .. })
        ));

        let short = FilterCriteria {
            start_date: Some("2021-1-5".into()),
            ..Default::default()
        };
        assert!(short.validate().is_err());
    }
}
