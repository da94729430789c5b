//! Output formatting and export of view results.
//!
//! Supports pretty-printing, JSON logging, and CSV export.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::aggregate::AggregateBucket;
use csv::WriterBuilder;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Flat CSV row for a bucket; the key is written in its display form.
#[derive(Debug, Serialize)]
struct BucketRow {
    key: String,
    value: f64,
    sample_count: usize,
}

/// Writes `rows` to a CSV file at `path` with a header, replacing any
/// existing file.
pub fn write_rows<T: Serialize>(path: &str, rows: &[T]) -> Result<()> {
    debug!(path, rows = rows.len(), "Writing CSV");

    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes buckets as `key,value,sample_count` rows.
pub fn write_buckets(path: &str, buckets: &[AggregateBucket]) -> Result<()> {
    let rows: Vec<BucketRow> = buckets
        .iter()
        .map(|b| BucketRow {
            key: b.key.to_string(),
            value: b.value,
            sample_count: b.sample_count,
        })
        .collect();
    write_rows(path, &rows)
}
