//! CSV payload validation and conversion into delivery records.
//!
//! All payloads are checked as one combined dataset before any batch work
//! starts. The first violation found rejects the whole input.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{RowRef, ValidationError};
use crate::record::DeliveryRecord;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "delivery_id",
    "pickup_lat",
    "pickup_lon",
    "dropoff_lat",
    "dropoff_lon",
    "timestamp",
];

const DELIVERY_ID: usize = 0;
const TIMESTAMP: usize = 5;

/// Coordinate columns as (field position, name, absolute bound).
const COORDINATES: [(usize, &str, f64); 4] = [
    (1, "pickup_lat", 90.0),
    (2, "pickup_lon", 180.0),
    (3, "dropoff_lat", 90.0),
    (4, "dropoff_lon", 180.0),
];

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Core fields of one data row, in `REQUIRED_COLUMNS` order.
struct RawRow {
    at: RowRef,
    fields: [String; 6],
}

#[derive(Debug, Clone)]
pub struct SchemaValidator {
    required: Vec<String>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect())
    }
}

impl SchemaValidator {
    /// `required` may add columns beyond the core schema; the core columns
    /// are always needed to build records.
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required
    }

    /// Validate every payload and return the combined records in payload,
    /// then row, order.
    pub fn validate<S: AsRef<str>>(&self, payloads: &[S]) -> Result<Vec<DeliveryRecord>, ValidationError> {
        let mut rows = Vec::new();
        for (payload, text) in payloads.iter().enumerate() {
            rows.extend(self.read_payload(payload, text.as_ref())?);
        }

        let ids = rows
            .iter()
            .map(|row| parse_delivery_id(&row.fields[DELIVERY_ID]).map_err(|reason| type_violation("delivery_id", row.at, reason)))
            .collect::<Result<Vec<u64>, _>>()?;
        check_unique(&ids, &rows)?;

        let mut coordinates = vec![[0.0_f64; 4]; rows.len()];
        for (slot, &(field, column, bound)) in COORDINATES.iter().enumerate() {
            for (row, values) in rows.iter().zip(coordinates.iter_mut()) {
                let value = parse_coordinate(&row.fields[field]).map_err(|reason| type_violation(column, row.at, reason))?;
                if !(-bound..=bound).contains(&value) {
                    return Err(ValidationError::RangeViolation {
                        column: column.to_string(),
                        at: row.at,
                        value,
                        min: -bound,
                        max: bound,
                    });
                }
                values[slot] = value;
            }
        }

        let timestamps = rows
            .iter()
            .map(|row| {
                let raw = &row.fields[TIMESTAMP];
                if raw.is_empty() {
                    return Err(type_violation("timestamp", row.at, "null value".to_string()));
                }
                parse_timestamp(raw).ok_or_else(|| ValidationError::TimestampViolation {
                    at: row.at,
                    value: raw.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let records = ids
            .into_iter()
            .zip(coordinates)
            .zip(timestamps)
            .map(|((delivery_id, [pickup_lat, pickup_lon, dropoff_lat, dropoff_lon]), timestamp)| DeliveryRecord {
                delivery_id,
                pickup_lat,
                pickup_lon,
                dropoff_lat,
                dropoff_lon,
                timestamp,
            })
            .collect();
        Ok(records)
    }

    fn read_payload(&self, payload: usize, text: &str) -> Result<Vec<RawRow>, ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput { payload });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| ValidationError::MalformedRow {
                at: RowRef { payload, row: 0 },
                message: e.to_string(),
            })?
            .iter()
            .map(str::to_string)
            .collect();
        if header.iter().all(|c| c.is_empty()) {
            return Err(ValidationError::EmptyInput { payload });
        }

        let mut expected: Vec<&str> = self.required.iter().map(String::as_str).collect();
        for core in REQUIRED_COLUMNS {
            if !expected.contains(&core) {
                expected.push(core);
            }
        }
        let missing: Vec<String> = expected
            .into_iter()
            .filter(|name| !header.iter().any(|c| c == name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::SchemaMismatch {
                payload,
                missing,
                found: header,
            });
        }

        // Every core column is present past this point.
        let positions = REQUIRED_COLUMNS.map(|name| header.iter().position(|c| c == name).unwrap_or(usize::MAX));

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let at = RowRef { payload, row: index + 1 };
            let record = result.map_err(|e| ValidationError::MalformedRow {
                at,
                message: e.to_string(),
            })?;
            let fields = positions.map(|p| record.get(p).unwrap_or_default().to_string());
            rows.push(RawRow { at, fields });
        }
        Ok(rows)
    }
}

fn type_violation(column: &str, at: RowRef, reason: String) -> ValidationError {
    ValidationError::TypeViolation {
        column: column.to_string(),
        at,
        reason,
    }
}

fn parse_delivery_id(raw: &str) -> Result<u64, String> {
    if raw.is_empty() {
        return Err("null value".to_string());
    }
    match raw.parse::<u64>() {
        Ok(id) => Ok(id),
        Err(_) if raw.parse::<i64>().is_ok() => Err(format!("{raw:?} is negative")),
        Err(_) => Err(format!("{raw:?} is not an integer")),
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, String> {
    if raw.is_empty() {
        return Err("null value".to_string());
    }
    let value: f64 = raw.parse().map_err(|_| format!("{raw:?} is not numeric"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{raw:?} is not finite"))
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn check_unique(ids: &[u64], rows: &[RawRow]) -> Result<(), ValidationError> {
    let mut seen: HashMap<u64, RowRef> = HashMap::with_capacity(ids.len());
    for (&delivery_id, row) in ids.iter().zip(rows) {
        if let Some(&first) = seen.get(&delivery_id) {
            return Err(ValidationError::DuplicateKey {
                delivery_id,
                first,
                at: row.at,
            });
        }
        seen.insert(delivery_id, row.at);
    }
    Ok(())
}
