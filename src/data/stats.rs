use super::trip_struct::TripRecord;
use serde::{Deserialize, Serialize};

/// Las seis cifras de las tarjetas del tablero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TripStats {
    pub total_trips: usize,
    pub avg_duration: f64,
    pub avg_distance: f64,
    pub avg_speed: f64,
    pub avg_fare: f64,
    pub total_fare: f64,
}

/// Suma y cantidad de valores numéricos vistos.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Calcula las estadísticas de una colección de viajes.
///
/// Los campos ausentes o no numéricos no cuentan para el promedio de ese
/// campo (igual que `AVG` en SQL). Sin viajes todo vale cero.
pub fn compute_stats(records: &[TripRecord]) -> TripStats {
    let mut duration = Accumulator::default();
    let mut distance = Accumulator::default();
    let mut speed = Accumulator::default();
    let mut fare = Accumulator::default();

    for trip in records {
        duration.push(trip.trip_duration());
        distance.push(trip.distance_km());
        speed.push(trip.speed_kmh());
        fare.push(trip.estimated_fare());
    }

    TripStats {
        total_trips: records.len(),
        avg_duration: duration.mean(),
        avg_distance: distance.mean(),
        avg_speed: speed.mean(),
        avg_fare: fare.mean(),
        total_fare: fare.sum,
    }
}
