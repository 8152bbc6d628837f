//! Line classification for the operational record file.
//!
//! Grammar: `<TAG><SEP><payload>`, one record per line. TAG is the first
//! character (`C` customer, `V` vehicle, `S` service), SEP is whitespace.
//! Anything else is ignored rather than rejected.

use serde::{Deserialize, Serialize};

/// A vehicle record: customer natural key plus a free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub customer_name: String,
    pub description: String,
}

/// A classified input record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Customer { name: String },
    Vehicle(VehicleRecord),
    Service { text: String },
}

/// Classify a single line.
///
/// Returns `None` for anything that should be skipped: unrecognized tags,
/// empty lines, empty payloads, and vehicle payloads that do not split on a
/// tab into exactly two non-empty fields. Skipping is policy, not an error.
#[must_use]
pub fn parse_line(line: &str) -> Option<Record> {
    let mut chars = line.chars();
    let tag = chars.next()?;
    let payload = chars.as_str().trim();

    if payload.is_empty() {
        return None;
    }

    match tag {
        'C' => Some(Record::Customer {
            name: payload.to_string(),
        }),
        'V' => {
            let parts: Vec<&str> = payload.split('\t').map(str::trim).collect();
            if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
                return None;
            }
            Some(Record::Vehicle(VehicleRecord {
                customer_name: parts[0].to_string(),
                description: parts[1].to_string(),
            }))
        }
        'S' => Some(Record::Service {
            text: payload.to_string(),
        }),
        _ => None,
    }
}

/// Lazily classify every line of `input`.
///
/// The iterator is finite and holds no state of its own; calling this again
/// on the same input restarts from the first line.
pub fn parse_records(input: &str) -> impl Iterator<Item = Record> + '_ {
    input.lines().filter_map(parse_line)
}
