use super::trip_struct::{FieldValue, TripRecord};
use crate::error::Result;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Convierte texto CSV (encabezado + filas) en viajes.
///
/// Las filas con distinta cantidad de campos que el encabezado se descartan
/// sin error. Un texto vacío da una colección vacía.
pub fn parse_records(text: &str) -> Vec<TripRecord> {
    parse_from_reader(text.as_bytes())
}

fn parse_from_reader<R: Read>(reader: R) -> Vec<TripRecord> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = match csv_reader.headers() {
        Ok(h) => h.iter().map(|name| name.trim().to_string()).collect(),
        Err(e) => {
            debug!(error = %e, "encabezado ilegible");
            return Vec::new();
        }
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Vec::new();
    }

    let mut records: Vec<TripRecord> = Vec::new();
    let mut dropped = 0usize;

    for (line, result) in csv_reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!(line = line + 2, error = %e, "fila ilegible descartada");
                dropped += 1;
                continue;
            }
        };

        if row.len() != headers.len() {
            debug!(
                line = line + 2,
                expected = headers.len(),
                got = row.len(),
                "fila con cantidad de campos distinta descartada"
            );
            dropped += 1;
            continue;
        }

        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(name, raw)| (name.clone(), FieldValue::coerce(raw)))
                .collect(),
        );
    }

    debug!(parsed = records.len(), dropped, "csv procesado");
    records
}

/// Carga viajes desde disco: CSV, o JSON si la extensión es `.json`.
/// Un archivo vacío da una colección vacía.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<TripRecord>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let records = if is_json {
        parse_json_records(&fs::read_to_string(path)?)?
    } else {
        let file = File::open(path)?;
        let buf_reader = BufReader::with_capacity(64 * 1024, file); // Buffer de 64KB
        parse_from_reader(buf_reader)
    };
    info!(path = %path.display(), records = records.len(), "viajes cargados");
    Ok(records)
}

/// Viajes recibidos como arreglo JSON de objetos (la respuesta del API).
///
/// Números y textos se conservan con su tipo; `null` se omite y los
/// booleanos quedan como texto.
pub fn parse_json_records(text: &str) -> Result<Vec<TripRecord>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(text)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .filter_map(|(name, value)| {
                    let value = match value {
                        Value::Null => return None,
                        Value::Number(n) => match n.as_f64() {
                            Some(f) => FieldValue::Number(f),
                            None => FieldValue::Text(n.to_string()),
                        },
                        Value::String(s) => FieldValue::Text(s),
                        Value::Bool(b) => FieldValue::Text(b.to_string()),
                        other => FieldValue::Text(other.to_string()),
                    };
                    Some((name, value))
                })
                .collect::<TripRecord>()
        })
        .collect())
}

/// Escribe viajes a CSV. El encabezado es la unión de columnas en orden de aparición.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[TripRecord]) -> Result<usize> {
    let path = path.as_ref();

    // Crear directorio padre si no existe
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let count = write_records_to(BufWriter::new(file), records)?;
    info!(path = %path.display(), records = count, "viajes exportados");
    Ok(count)
}

pub fn write_records_to<W: Write>(writer: W, records: &[TripRecord]) -> Result<usize> {
    let mut columns: Vec<&str> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    if columns.is_empty() {
        csv_writer.flush()?;
        return Ok(0);
    }
    csv_writer.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|name| record.get(name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        csv_writer.write_record(&row)?;
    }
    csv_writer.flush()?;

    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::trip_struct::{PASSENGER_COUNT, PICKUP_DATETIME, VENDOR_ID};

    const SAMPLE: &str = "pickup_datetime,vendor_id,passenger_count,store_and_fwd_flag\n\
        2021-01-01 08:00:00,1,2,N\n\
        2021-01-02 09:00:00,2,1\n\
        2021-01-03 10:00:00,2,3,Y\n";

    #[test]
    fn parses_and_coerces_fields() {
        let records = parse_records(SAMPLE);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.pickup_datetime(), Some("2021-01-01 08:00:00"));
        assert_eq!(first.get(VENDOR_ID), Some(&FieldValue::Number(1.0)));
        assert_eq!(first.get(PASSENGER_COUNT), Some(&FieldValue::Number(2.0)));
        assert_eq!(
            first.get("store_and_fwd_flag"),
            Some(&FieldValue::Text("N".into()))
        );
    }

    #[test]
    fn drops_rows_with_wrong_field_count() {
        let records = parse_records(SAMPLE);
        // la fila del 2021-01-02 tiene un campo menos
        assert!(records
            .iter()
            .all(|r| r.pickup_date() != Some("2021-01-02")));
        assert_eq!(records[1].pickup_date(), Some("2021-01-03"));
    }

    #[test]
    fn empty_text_gives_no_records() {
        assert!(parse_records("").is_empty());
        assert!(parse_records("pickup_datetime,vendor_id\n").is_empty());
    }

    #[test]
    fn json_rows_keep_types() {
        let text = r#"[{"pickup_datetime":"2021-01-01 08:00:00","vendor_id":"2","passenger_count":1,"note":null}]"#;
        let records = parse_json_records(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(VENDOR_ID), Some(&FieldValue::Text("2".into())));
        assert_eq!(records[0].get(PASSENGER_COUNT), Some(&FieldValue::Number(1.0)));
        assert!(records[0].get("note").is_none());
        assert_eq!(
            records[0].get(PICKUP_DATETIME),
            Some(&FieldValue::Text("2021-01-01 08:00:00".into()))
        );
    }

    #[test]
    fn writes_union_of_columns() {
        let records = vec![
            TripRecord::new().with("a", 1.0).with("b", "x"),
            TripRecord::new().with("a", 2.5).with("c", "y"),
        ];
        let mut out = Vec::new();
        let count = write_records_to(&mut out, &records).unwrap();
        assert_eq!(count, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "a,b,c\n1,x,\n2.5,,y\n");
    }
}
