use super::trip_struct::TripRecord;

/// Multiplicador de Tukey para las cercas del IQR.
pub const IQR_FENCE: f64 = 1.5;

/// Percentil con interpolación lineal entre rangos vecinos. `p` va de 0 a 100.
/// Sin valores devuelve 0.0.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p.clamp(0.0, 100.0) / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Cercas `(Q1 - 1.5·IQR, Q3 + 1.5·IQR)`, o `None` sin valores.
pub fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let q1 = percentile(values, 25.0);
    let q3 = percentile(values, 75.0);
    let iqr = q3 - q1;
    Some((q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr))
}

/// Índices (dentro de `records`) de los viajes con duración atípica.
pub fn detect_duration_anomalies(records: &[TripRecord]) -> Vec<usize> {
    let durations: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, trip)| trip.trip_duration().map(|d| (i, d)))
        .collect();
    let values: Vec<f64> = durations.iter().map(|(_, d)| *d).collect();

    let Some((lower, upper)) = iqr_bounds(&values) else {
        return Vec::new();
    };

    durations
        .into_iter()
        .filter(|(_, d)| *d < lower || *d > upper)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::trip_struct::TRIP_DURATION;

    #[test]
    fn percentile_interpolates() {
        assert_eq!(percentile(&[], 50.0), 0.0);
        assert_eq!(percentile(&[42.0], 90.0), 42.0);
        assert!((percentile(&[3.0, 1.0, 5.0, 2.0, 4.0], 50.0) - 3.0).abs() < 1e-10);
        // rango 0.75 entre 1 y 2
        assert!((percentile(&[1.0, 2.0, 3.0, 4.0], 25.0) - 1.75).abs() < 1e-10);
    }

    #[test]
    fn flags_values_outside_fences() {
        let durations = [600.0, 620.0, 640.0, 660.0, 680.0, 700.0, 20_000.0, 1.0];
        let mut records: Vec<TripRecord> = durations
            .iter()
            .map(|d| TripRecord::new().with(TRIP_DURATION, *d))
            .collect();
        records.insert(2, TripRecord::new().with(TRIP_DURATION, "sin dato"));

        // el texto no cuenta pero sí corre los índices
        assert_eq!(detect_duration_anomalies(&records), vec![7, 8]);
    }

    #[test]
    fn no_anomalies_without_durations() {
        assert!(detect_duration_anomalies(&[]).is_empty());
        assert!(detect_duration_anomalies(&[TripRecord::new()]).is_empty());
    }

    #[test]
    fn identical_values_are_not_outliers() {
        let records: Vec<_> = (0..5)
            .map(|_| TripRecord::new().with(TRIP_DURATION, 300.0))
            .collect();
        assert!(detect_duration_anomalies(&records).is_empty());
    }
}
