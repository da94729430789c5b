//! Grouping and reduction of listing records into buckets.
//!
//! An [`Aggregation`] pairs a [`GroupBy`] key with a [`Reduction`] and turns
//! a slice of records into an ordered `Vec<AggregateBucket>`. Empty groups
//! (only produced with `include_empty`) report a value of `0.0`; callers tell
//! them apart from real zeros through `sample_count`.

use anyhow::anyhow;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::dataset::{City, ListingRecord, Period};

pub const DEFAULT_BIN_SIZE_KM: f64 = 0.5;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of a slice; the two middle values are averaged for even lengths.
/// Returns 0.0 for empty input.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// The grouping value a bucket was reduced over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketKey {
    /// Lower edge of a distance bin, in km.
    DistanceBin { km: f64 },
    City { city: City },
    HostPeriod { superhost: bool, period: Period },
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::DistanceBin { km } => write!(f, "{km}"),
            BucketKey::City { city } => write!(f, "{city}"),
            BucketKey::HostPeriod { superhost, period } => {
                let host = if *superhost {
                    "superhost"
                } else {
                    "non-superhost"
                };
                write!(f, "{host}/{period}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub key: BucketKey,
    pub value: f64,
    pub sample_count: usize,
}

impl AggregateBucket {
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupBy {
    /// Fixed-width bins over `distance_km`.
    DistanceBin { bin_size: f64 },
    City,
    /// Superhost flag crossed with weekday/weekend.
    HostPeriod,
}

/// Record predicate used by percentage reductions.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingPredicate {
    /// Case-insensitive substring match on the raw room type.
    RoomTypeContains(String),
    Superhost,
}

impl ListingPredicate {
    /// Listings for a whole home or apartment.
    pub fn entire_home() -> Self {
        ListingPredicate::RoomTypeContains("entire".to_string())
    }

    pub fn matches(&self, record: &ListingRecord) -> bool {
        match self {
            ListingPredicate::RoomTypeContains(needle) => record
                .room_type
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            ListingPredicate::Superhost => record.is_superhost,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    MeanPrice,
    MedianDistance,
    /// Share of the group matching the predicate, in percent.
    Percentage(ListingPredicate),
}

impl Reduction {
    fn reduce(&self, group: &[&ListingRecord]) -> f64 {
        match self {
            Reduction::MeanPrice => {
                let prices: Vec<f64> = group.iter().map(|r| r.price).collect();
                mean(&prices)
            }
            Reduction::MedianDistance => {
                let distances: Vec<f64> = group.iter().map(|r| r.distance_km).collect();
                median(&distances)
            }
            Reduction::Percentage(pred) => {
                let hits = group.iter().filter(|r| pred.matches(r)).count();
                pct(hits, group.len())
            }
        }
    }
}

/// Ordering of categorical output. Distance bins are always ascending by bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketOrder {
    #[default]
    Discovery,
    Ascending,
    Descending,
}

impl FromStr for BucketOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" | "none" => Ok(BucketOrder::Discovery),
            "asc" | "ascending" => Ok(BucketOrder::Ascending),
            "desc" | "descending" => Ok(BucketOrder::Descending),
            other => Err(anyhow!("unknown sort order: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub group_by: GroupBy,
    pub reduction: Reduction,
    pub order: BucketOrder,
    /// Seed every possible categorical key so empty groups still appear.
    pub include_empty: bool,
}

impl Aggregation {
    pub fn new(group_by: GroupBy, reduction: Reduction) -> Self {
        Self {
            group_by,
            reduction,
            order: BucketOrder::Discovery,
            include_empty: false,
        }
    }

    pub fn ordered(mut self, order: BucketOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_empty(mut self) -> Self {
        self.include_empty = true;
        self
    }

    pub fn run(&self, records: &[ListingRecord]) -> Vec<AggregateBucket> {
        match self.group_by {
            GroupBy::DistanceBin { bin_size } => self.run_binned(records, bin_size),
            GroupBy::City => {
                let seed: Vec<BucketKey> = City::ALL
                    .into_iter()
                    .map(|city| BucketKey::City { city })
                    .collect();
                self.run_categorical(records, &seed, |r| BucketKey::City { city: r.city })
            }
            GroupBy::HostPeriod => {
                let seed: Vec<BucketKey> = [false, true]
                    .into_iter()
                    .flat_map(|superhost| {
                        Period::ALL
                            .into_iter()
                            .map(move |period| BucketKey::HostPeriod { superhost, period })
                    })
                    .collect();
                self.run_categorical(records, &seed, |r| BucketKey::HostPeriod {
                    superhost: r.is_superhost,
                    period: r.period,
                })
            }
        }
    }

    fn run_binned(&self, records: &[ListingRecord], bin_size: f64) -> Vec<AggregateBucket> {
        if !(bin_size > 0.0) || !bin_size.is_finite() {
            return Vec::new();
        }

        // Integer bin indices keep keys exact and the map ascending.
        let mut bins: BTreeMap<i64, Vec<&ListingRecord>> = BTreeMap::new();
        for r in records.iter().filter(|r| r.distance_km.is_finite()) {
            let idx = (r.distance_km / bin_size).floor() as i64;
            bins.entry(idx).or_default().push(r);
        }

        bins.into_iter()
            .map(|(idx, group)| AggregateBucket {
                key: BucketKey::DistanceBin {
                    km: idx as f64 * bin_size,
                },
                value: self.reduction.reduce(&group),
                sample_count: group.len(),
            })
            .collect()
    }

    fn run_categorical<F>(
        &self,
        records: &[ListingRecord],
        seed: &[BucketKey],
        key_of: F,
    ) -> Vec<AggregateBucket>
    where
        F: Fn(&ListingRecord) -> BucketKey,
    {
        let mut keys: Vec<BucketKey> = Vec::new();
        let mut groups: Vec<Vec<&ListingRecord>> = Vec::new();

        if self.include_empty {
            for key in seed {
                keys.push(*key);
                groups.push(Vec::new());
            }
        }

        for r in records {
            let key = key_of(r);
            let i = match keys.iter().position(|k| *k == key) {
                Some(i) => i,
                None => {
                    keys.push(key);
                    groups.push(Vec::new());
                    keys.len() - 1
                }
            };
            groups[i].push(r);
        }

        let mut buckets: Vec<AggregateBucket> = keys
            .into_iter()
            .zip(groups)
            .map(|(key, group)| AggregateBucket {
                key,
                value: if group.is_empty() {
                    0.0
                } else {
                    self.reduction.reduce(&group)
                },
                sample_count: group.len(),
            })
            .collect();

        sort_buckets(&mut buckets, self.order);
        buckets
    }
}

/// Stable sort by value; ties keep their current order.
pub fn sort_buckets(buckets: &mut [AggregateBucket], order: BucketOrder) {
    match order {
        BucketOrder::Discovery => {}
        BucketOrder::Ascending => buckets.sort_by(|a, b| a.value.total_cmp(&b.value)),
        BucketOrder::Descending => buckets.sort_by(|a, b| b.value.total_cmp(&a.value)),
    }
}
