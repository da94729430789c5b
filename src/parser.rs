//! CSV parser for rental-listing source files.
//!
//! Columns are resolved by header name once per file, then every row is
//! coerced into a [`ListingRecord`]. Rows whose required numbers do not
//! coerce are skipped, never defaulted.

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::dataset::{DatasetId, ListingRecord};

pub const PRICE_COLUMN: &str = "realSum";
pub const DISTANCE_COLUMN: &str = "dist";
pub const SATISFACTION_COLUMN: &str = "guest_satisfaction_overall";
pub const ROOM_TYPE_COLUMN: &str = "room_type";
pub const BEDROOMS_COLUMN: &str = "bedrooms";
pub const SUPERHOST_COLUMN: &str = "host_is_superhost";

/// How a missing or malformed distance is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistancePolicy {
    /// The row is skipped.
    #[default]
    Required,
    /// The distance becomes `0.0`; for views that never aggregate on distance.
    DefaultZero,
}

/// Positions of the known columns within one file's header row.
#[derive(Debug)]
struct Columns {
    price: usize,
    distance: Option<usize>,
    satisfaction: Option<usize>,
    room_type: Option<usize>,
    bedrooms: Option<usize>,
    superhost: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, policy: DistancePolicy) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let Some(price) = find(PRICE_COLUMN) else {
            bail!("missing required column `{PRICE_COLUMN}`");
        };
        let distance = find(DISTANCE_COLUMN);
        if distance.is_none() && policy == DistancePolicy::Required {
            bail!("missing required column `{DISTANCE_COLUMN}`");
        }

        Ok(Self {
            price,
            distance,
            satisfaction: find(SATISFACTION_COLUMN),
            room_type: find(ROOM_TYPE_COLUMN),
            bedrooms: find(BEDROOMS_COLUMN),
            superhost: find(SUPERHOST_COLUMN),
        })
    }
}

/// Coerces a field to a finite float. Empty, non-numeric and non-finite
/// values yield `None`.
pub fn parse_number(field: Option<&str>) -> Option<f64> {
    field
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Bedroom count, defaulting to 1 for missing, non-numeric or zero values.
pub fn parse_bedrooms(field: Option<&str>) -> u32 {
    parse_number(field)
        .filter(|v| *v >= 1.0)
        .map(|v| v.trunc() as u32)
        .unwrap_or(1)
}

/// Only the literal `True` counts as a superhost.
pub fn parse_superhost(field: Option<&str>) -> bool {
    field == Some("True")
}

/// Parses the text of one source file into listing records.
///
/// # Errors
///
/// Returns an error only when the header row cannot be read or lacks a
/// required column. Individual bad rows are skipped.
pub fn parse_listings(
    text: &str,
    dataset: DatasetId,
    policy: DistancePolicy,
) -> Result<Vec<ListingRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", dataset.file_name()))?
        .clone();
    let cols = Columns::resolve(&headers, policy)
        .with_context(|| format!("resolving columns of {}", dataset.file_name()))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(error = %e, "Unreadable CSV row skipped");
                skipped += 1;
                continue;
            }
        };

        match parse_row(&row, &cols, dataset, policy) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    debug!(
        dataset = %dataset,
        parsed = records.len(),
        skipped,
        "Source parsed"
    );

    Ok(records)
}

fn parse_row(
    row: &StringRecord,
    cols: &Columns,
    dataset: DatasetId,
    policy: DistancePolicy,
) -> Option<ListingRecord> {
    let field = |idx: Option<usize>| idx.and_then(|i| row.get(i));

    let price = parse_number(row.get(cols.price))?;
    let distance_km = match (parse_number(field(cols.distance)), policy) {
        (Some(d), _) => d,
        (None, DistancePolicy::DefaultZero) => 0.0,
        (None, DistancePolicy::Required) => return None,
    };

    Some(ListingRecord {
        price,
        distance_km,
        guest_satisfaction: parse_number(field(cols.satisfaction)),
        room_type: field(cols.room_type).unwrap_or_default().to_string(),
        bedrooms: parse_bedrooms(field(cols.bedrooms)),
        is_superhost: parse_superhost(field(cols.superhost)),
        city: dataset.city,
        period: dataset.period,
    })
}
