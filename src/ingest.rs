use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::AnalysisError;
use crate::models::{EventKind, EventRecord};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Deserialize)]
struct CsvRow {
    user_id: String,
    timestamp: String,
    event: String,
    variant: String,
}

pub fn load_events(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open event log {}", path.display()))?;
    let events = read_events(file)
        .with_context(|| format!("failed to parse event log {}", path.display()))?;
    tracing::info!(rows = events.len(), path = %path.display(), "event log loaded");
    Ok(events)
}

pub fn read_events<R: Read>(input: R) -> anyhow::Result<Vec<EventRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut events = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // header occupies line 1
        let row_number = index + 2;
        let row = result.with_context(|| format!("malformed row {row_number}"))?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
            AnalysisError::InvalidTimestamp {
                row: row_number,
                value: row.timestamp.clone(),
            }
        })?;

        events.push(EventRecord {
            user_id: row.user_id,
            timestamp,
            event: EventKind::from(row.event),
            variant: row.variant,
        });
    }

    Ok(events)
}

/// Accepts space- or `T`-separated datetimes, RFC 3339 (normalised to UTC)
/// and bare dates at midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
