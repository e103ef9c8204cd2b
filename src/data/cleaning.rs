use super::data_lector::{load_records, write_records};
use super::trip_struct::{
    DISTANCE_KM, ESTIMATED_FARE, FieldValue, PASSENGER_COUNT, PICKUP_DATETIME, SPEED_KMH,
    TRIP_DURATION, TripRecord,
};
use crate::error::Result;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub const DROPOFF_DATETIME: &str = "dropoff_datetime";
pub const PICKUP_LONGITUDE: &str = "pickup_longitude";
pub const PICKUP_LATITUDE: &str = "pickup_latitude";
pub const DROPOFF_LONGITUDE: &str = "dropoff_longitude";
pub const DROPOFF_LATITUDE: &str = "dropoff_latitude";
pub const DISTANCE_MILES: &str = "distance_miles";
pub const DURATION_MINUTES: &str = "duration_minutes";

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const KM_TO_MILES: f64 = 0.621371;
/// Viajes de 24 horas o más se consideran inválidos.
pub const MAX_TRIP_SECS: f64 = 86_400.0;

// Tarifa aproximada: 2.5 fijo, 0.5 por 1/5 de milla, 0.5 por minuto
const FARE_BASE: f64 = 2.5;
const FARE_PER_FIFTH_MILE: f64 = 0.5;
const FARE_PER_MINUTE: f64 = 0.5;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ACCEPTED_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Rectángulo aproximado de Nueva York.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

pub const NYC_BOUNDS: GeoBounds = GeoBounds {
    min_lon: -74.3,
    max_lon: -73.7,
    min_lat: 40.5,
    max_lat: 40.9,
};

impl GeoBounds {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        (self.min_lon..=self.max_lon).contains(&lon) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningCounts {
    pub original: usize,
    pub after_missing: usize,
    pub after_duplicates: usize,
    pub after_validity: usize,
    pub excluded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CleaningReport {
    pub records: Vec<TripRecord>,
    pub counts: CleaningCounts,
}

/// Distancia de gran círculo en km.
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn estimate_fare(distance_km: f64, duration_secs: f64) -> f64 {
    let miles = distance_km * KM_TO_MILES;
    FARE_BASE + (miles / 0.2) * FARE_PER_FIFTH_MILE + (duration_secs / 60.0) * FARE_PER_MINUTE
}

/// Lleva una marca de tiempo a `YYYY-MM-DD HH:MM:SS`.
pub fn normalize_datetime(raw: &str) -> Option<String> {
    let raw = raw.trim();
    for format in ACCEPTED_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.format(DATETIME_FORMAT).to_string());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc().format(DATETIME_FORMAT).to_string())
}

fn has_missing(record: &TripRecord) -> bool {
    record
        .fields()
        .iter()
        .any(|(_, v)| matches!(v, FieldValue::Text(s) if s.trim().is_empty()))
}

fn row_key(record: &TripRecord) -> String {
    record
        .fields()
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

/// Valida un viaje crudo y le agrega los campos derivados.
fn enrich(mut record: TripRecord) -> Option<TripRecord> {
    let passengers = record.number(PASSENGER_COUNT)?;
    let duration = record.number(TRIP_DURATION)?;
    if passengers <= 0.0 || duration <= 0.0 || duration >= MAX_TRIP_SECS {
        return None;
    }

    let pickup_lon = record.number(PICKUP_LONGITUDE)?;
    let pickup_lat = record.number(PICKUP_LATITUDE)?;
    let dropoff_lon = record.number(DROPOFF_LONGITUDE)?;
    let dropoff_lat = record.number(DROPOFF_LATITUDE)?;
    if !NYC_BOUNDS.contains(pickup_lon, pickup_lat) || !NYC_BOUNDS.contains(dropoff_lon, dropoff_lat)
    {
        return None;
    }

    let pickup = normalize_datetime(record.get(PICKUP_DATETIME)?.as_text()?)?;
    let dropoff = normalize_datetime(record.get(DROPOFF_DATETIME)?.as_text()?)?;
    record.insert(PICKUP_DATETIME, pickup);
    record.insert(DROPOFF_DATETIME, dropoff);

    let distance_km = haversine(pickup_lat, pickup_lon, dropoff_lat, dropoff_lon);
    record.insert(DISTANCE_KM, distance_km);
    record.insert(SPEED_KMH, distance_km / (duration / 3600.0));
    record.insert(DISTANCE_MILES, distance_km * KM_TO_MILES);
    record.insert(DURATION_MINUTES, duration / 60.0);
    record.insert(ESTIMATED_FARE, estimate_fare(distance_km, duration));

    Some(record)
}

/// Limpia viajes crudos: faltantes, duplicados, inválidos y campos derivados.
pub fn clean_trips(raw: Vec<TripRecord>, limit: Option<usize>) -> CleaningReport {
    let mut rows = raw;
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    let original = rows.len();

    rows.retain(|r| !has_missing(r));
    let after_missing = rows.len();

    let mut seen = HashSet::new();
    rows.retain(|r| seen.insert(row_key(r)));
    let after_duplicates = rows.len();

    let records: Vec<TripRecord> = rows.into_iter().filter_map(enrich).collect();
    let after_validity = records.len();

    let counts = CleaningCounts {
        original,
        after_missing,
        after_duplicates,
        after_validity,
        excluded: original - after_validity,
    };
    info!(
        original,
        after_missing,
        after_duplicates,
        after_validity,
        excluded = counts.excluded,
        "limpieza terminada"
    );

    CleaningReport { records, counts }
}

/// Lee el CSV crudo, lo limpia y guarda el resultado.
pub fn clean_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    limit: Option<usize>,
) -> Result<CleaningCounts> {
    let raw = load_records(input)?;
    let report = clean_trips(raw, limit);
    write_records(output, &report.records)?;
    Ok(report.counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_lector::parse_records;

    const HEADER: &str = "id,vendor_id,pickup_datetime,dropoff_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,store_and_fwd_flag,trip_duration";

    fn raw(rows: &[&str]) -> Vec<TripRecord> {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        parse_records(&text)
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        assert!(haversine(40.0, -74.0, 40.0, -74.0).abs() < 1e-12);
        assert!((haversine(40.0, -74.0, 41.0, -74.0) - 111.195).abs() < 0.01);
    }

    #[test]
    fn fare_formula() {
        // 0 km, 10 minutos
        assert!((estimate_fare(0.0, 600.0) - 7.5).abs() < 1e-9);
        let km = 1.0 / KM_TO_MILES;
        assert!((estimate_fare(km, 0.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn normalizes_datetimes() {
        assert_eq!(
            normalize_datetime("2016-03-14 17:24:55").as_deref(),
            Some("2016-03-14 17:24:55")
        );
        assert_eq!(
            normalize_datetime("2016-03-14T17:24:55").as_deref(),
            Some("2016-03-14 17:24:55")
        );
        assert_eq!(
            normalize_datetime("2016-03-14 17:24").as_deref(),
            Some("2016-03-14 17:24:00")
        );
        assert_eq!(normalize_datetime("ayer"), None);
    }

    #[test]
    fn cleaning_stages() {
        let good = "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.98,40.76,-73.96,40.76,N,455";
        let records = raw(&[
            good,
            good,
            "id2,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-73.98,40.73,-73.99,40.72,,663",
            "id3,1,2016-06-12 00:43:35,2016-06-12 00:54:38,0,-73.98,40.73,-73.99,40.72,N,663",
            "id4,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-75.50,40.73,-73.99,40.72,N,663",
            "id5,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-73.98,40.73,-73.99,40.72,N,90000",
        ]);
        let report = clean_trips(records, None);

        assert_eq!(
            report.counts,
            CleaningCounts {
                original: 6,
                after_missing: 5,
                after_duplicates: 4,
                after_validity: 1,
                excluded: 5,
            }
        );
        let trip = &report.records[0];
        assert_eq!(trip.get("id"), Some(&FieldValue::Text("id1".into())));
        let distance = trip.distance_km().unwrap();
        assert!(distance > 1.0 && distance < 2.0);
        assert!((trip.speed_kmh().unwrap() - distance / (455.0 / 3600.0)).abs() < 1e-9);
        assert!((trip.estimated_fare().unwrap() - estimate_fare(distance, 455.0)).abs() < 1e-9);
    }

    #[test]
    fn limit_applies_before_cleaning() {
        let good = "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.98,40.76,-73.96,40.76,N,455";
        let report = clean_trips(raw(&[good, good, good]), Some(1));
        assert_eq!(report.counts.original, 1);
        assert_eq!(report.records.len(), 1);
    }
}
