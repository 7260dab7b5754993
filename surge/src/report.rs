//! Persisted per-request output.
//!
//! One header row (`Start,Duration,IsError`, with a leading `Name` column when any stat is
//! named) followed by one row per stat.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use surge_core::Stat;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unable to access report file: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed report: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct Row {
    #[serde(rename = "Start")]
    start: i64,
    #[serde(rename = "Duration")]
    duration: i64,
    #[serde(rename = "IsError")]
    is_error: bool,
}

#[derive(Serialize)]
struct NamedRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Start")]
    start: i64,
    #[serde(rename = "Duration")]
    duration: i64,
    #[serde(rename = "IsError")]
    is_error: bool,
}

#[derive(Deserialize)]
struct ParsedRow {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Start")]
    start: i64,
    #[serde(rename = "Duration")]
    duration: i64,
    #[serde(rename = "IsError")]
    is_error: bool,
}

pub fn write_csv<W: io::Write>(writer: W, stats: &[Stat]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let named = stats.iter().any(|s| s.name.is_some());

    if stats.is_empty() {
        wtr.write_record(["Start", "Duration", "IsError"])?;
    }

    for stat in stats {
        if named {
            wtr.serialize(NamedRow {
                name: stat.name.as_deref().unwrap_or_default(),
                start: stat.start_nanos,
                duration: stat.duration_nanos,
                is_error: stat.is_error,
            })?;
        } else {
            wtr.serialize(Row {
                start: stat.start_nanos,
                duration: stat.duration_nanos,
                is_error: stat.is_error,
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Creates or truncates `path`.
pub fn write_csv_file(path: impl AsRef<Path>, stats: &[Stat]) -> Result<(), ReportError> {
    write_csv(File::create(path)?, stats)
}

pub fn read_csv<R: io::Read>(reader: R) -> Result<Vec<Stat>, ReportError> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize::<ParsedRow>()
        .map(|row| -> Result<Stat, ReportError> {
            let row = row?;
            let stat = Stat::new(row.start, row.duration, row.is_error);
            Ok(match row.name {
                Some(name) => stat.named(Arc::from(name)),
                None => stat,
            })
        })
        .collect()
}

pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Vec<Stat>, ReportError> {
    read_csv(File::open(path)?)
}
