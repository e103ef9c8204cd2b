use super::trip_struct::{FieldValue, TripRecord};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Ancho de cada barra del histograma de duración, en segundos.
pub const DURATION_BUCKET_SECS: f64 = 300.0;
/// El mismo ancho expresado en minutos, que es como se rotula la barra.
pub const DURATION_BUCKET_MINUTES: f64 = 5.0;

/// Serie categórica lista para un gráfico de barras o de línea.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountSeries {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

impl CountSeries {
    pub fn get(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.counts.get(i).copied())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Las cuatro series que consume la capa de gráficos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSeries {
    pub duration_histogram: CountSeries,
    pub passenger_distribution: CountSeries,
    pub time_series: CountSeries,
    pub distance_fare: Vec<ScatterPoint>,
}

/// Números primero (de menor a mayor), texto después sin reordenar.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SortKey {
    Number(f64),
    Text,
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text) => Ordering::Less,
            (SortKey::Text, SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text, SortKey::Text) => Ordering::Equal,
        }
    }
}

/// Conteo por clave que recuerda el orden de primera aparición.
#[derive(Default)]
struct Grouper {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Grouper {
    fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Claves numéricas de menor a mayor; las de texto después, en orden de llegada.
    ///
    /// Una clave es numérica con la misma regla que `FieldValue::coerce`,
    /// así `"NaN"` o `"inf"` cuentan como texto.
    fn numeric_order(mut self) -> CountSeries {
        self.entries.sort_by_cached_key(|(key, _)| match FieldValue::coerce(key) {
            FieldValue::Number(n) => SortKey::Number(n),
            FieldValue::Text(_) => SortKey::Text,
        });
        self.finish()
    }

    fn text_order(mut self) -> CountSeries {
        self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        self.finish()
    }

    fn finish(self) -> CountSeries {
        let (labels, counts) = self.entries.into_iter().unzip();
        CountSeries { labels, counts }
    }
}

/// Barra de 5 minutos a la que pertenece una duración en segundos.
pub fn duration_bucket(duration_secs: f64) -> f64 {
    (duration_secs / DURATION_BUCKET_SECS).floor() * DURATION_BUCKET_MINUTES
}

/// Histograma disperso: sólo aparecen las barras con al menos un viaje.
pub fn duration_histogram(records: &[TripRecord]) -> CountSeries {
    let mut grouper = Grouper::default();
    for duration in records.iter().filter_map(TripRecord::trip_duration) {
        grouper.add(FieldValue::Number(duration_bucket(duration)).key());
    }
    grouper.numeric_order()
}

pub fn passenger_distribution(records: &[TripRecord]) -> CountSeries {
    let mut grouper = Grouper::default();
    for passengers in records.iter().filter_map(TripRecord::passenger_count) {
        grouper.add(passengers.key());
    }
    grouper.numeric_order()
}

/// Viajes por fecha de recogida, ordenados por fecha.
pub fn time_series(records: &[TripRecord]) -> CountSeries {
    let mut grouper = Grouper::default();
    for date in records.iter().filter_map(TripRecord::pickup_date) {
        grouper.add(date.to_string());
    }
    grouper.text_order()
}

/// Un punto (distancia, tarifa) por viaje con ambos valores numéricos.
///
/// A diferencia del tablero web, que graficaba todos los viajes, los que no
/// tienen distancia o tarifa numérica no generan punto: en el gráfico serían
/// coordenadas vacías.
pub fn distance_fare_scatter(records: &[TripRecord]) -> Vec<ScatterPoint> {
    records
        .iter()
        .filter_map(|trip| match (trip.distance_km(), trip.estimated_fare()) {
            (Some(x), Some(y)) => Some(ScatterPoint { x, y }),
            _ => None,
        })
        .collect()
}

pub fn build_series(records: &[TripRecord]) -> DashboardSeries {
    DashboardSeries {
        duration_histogram: duration_histogram(records),
        passenger_distribution: passenger_distribution(records),
        time_series: time_series(records),
        distance_fare: distance_fare_scatter(records),
    }
}
