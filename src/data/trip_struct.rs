use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const PICKUP_DATETIME: &str = "pickup_datetime";
pub const VENDOR_ID: &str = "vendor_id";
pub const PASSENGER_COUNT: &str = "passenger_count";
pub const TRIP_DURATION: &str = "trip_duration";
pub const DISTANCE_KM: &str = "distance_km";
pub const SPEED_KMH: &str = "speed_kmh";
pub const ESTIMATED_FARE: &str = "estimated_fare";

/// Valor de una celda: número si "parece numérico", texto si no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Convierte una celda cruda. Vacío, espacios, `NaN` o infinitos quedan como texto.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return FieldValue::Number(n);
                }
            }
        }
        FieldValue::Text(raw.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Clave normalizada usada para agrupar y para comparar con criterios.
    ///
    /// `2`, `2.0` y `"2"` producen la misma clave `"2"`.
    pub fn key(&self) -> String {
        match self {
            FieldValue::Number(n) => number_key(*n),
            FieldValue::Text(s) => normalize_key(s),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", number_key(*n)),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

fn number_key(n: f64) -> String {
    // -0 y 0 son la misma clave
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{}", n)
}

/// Normaliza un valor textual: si es numérico usa la forma corta del número.
pub fn normalize_key(raw: &str) -> String {
    match FieldValue::coerce(raw) {
        FieldValue::Number(n) => number_key(n),
        FieldValue::Text(_) => raw.trim().to_string(),
    }
}

/// Un viaje. Conserva todas las columnas en el orden de llegada.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripRecord {
    fields: Vec<(String, FieldValue)>,
}

impl TripRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserta o reemplaza un campo sin cambiar su posición.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn pickup_datetime(&self) -> Option<&str> {
        self.get(PICKUP_DATETIME).and_then(FieldValue::as_text)
    }

    /// Fecha de recogida: lo que hay antes del primer espacio.
    pub fn pickup_date(&self) -> Option<&str> {
        self.pickup_datetime()
            .map(|dt| dt.split(' ').next().unwrap_or(dt))
    }

    pub fn vendor_id(&self) -> Option<&FieldValue> {
        self.get(VENDOR_ID)
    }

    pub fn passenger_count(&self) -> Option<&FieldValue> {
        self.get(PASSENGER_COUNT)
    }

    pub fn trip_duration(&self) -> Option<f64> {
        self.number(TRIP_DURATION)
    }

    pub fn distance_km(&self) -> Option<f64> {
        self.number(DISTANCE_KM)
    }

    pub fn speed_kmh(&self) -> Option<f64> {
        self.number(SPEED_KMH)
    }

    pub fn estimated_fare(&self) -> Option<f64> {
        self.number(ESTIMATED_FARE)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for TripRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = TripRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for TripRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
