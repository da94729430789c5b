//! Runtime configuration.
//!
//! [`AppConfig`] comes from the environment (a `.env` file is honoured by the
//! binary through `dotenvy`). [`ViewThresholds`] holds the per-view filter
//! bounds and may be overridden from a JSON file:
//!
//! ```json
//! {
//!   "bin_size_km": 0.5,
//!   "max_distance_km": 7.0,
//!   "value_max_price": 1600.0
//! }
//! ```
//!
//! Keys left out keep their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_BIN_SIZE_KM;
use crate::filter::{
    DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_SATISFACTION, DEFAULT_MIN_SATISFACTION,
    DEFAULT_VALUE_MAX_PRICE, ListingFilter,
};
use crate::loader::DEFAULT_CONCURRENCY;

pub const DATA_ROOT_VAR: &str = "LISTINGS_DATA_ROOT";
pub const CONCURRENCY_VAR: &str = "LISTINGS_CONCURRENCY";
pub const LOG_FILE_VAR: &str = "LOG_FILE_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory or base URL holding the dataset files.
    pub data_root: String,
    pub concurrency: usize,
    pub log_file_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let concurrency = match lookup(CONCURRENCY_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{CONCURRENCY_VAR} must be a positive integer, got {raw:?}"))?,
            None => DEFAULT_CONCURRENCY,
        };

        Ok(Self {
            data_root: lookup(DATA_ROOT_VAR).unwrap_or_else(|| "data".to_string()),
            concurrency,
            log_file_path: lookup(LOG_FILE_VAR)
                .unwrap_or_else(|| "logs/listing_insights.log".to_string()),
        })
    }
}

/// Filter and binning bounds used by the views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewThresholds {
    pub bin_size_km: f64,
    pub max_distance_km: f64,
    pub value_max_price: f64,
    pub min_satisfaction: f64,
    pub max_satisfaction: f64,
}

impl Default for ViewThresholds {
    fn default() -> Self {
        Self {
            bin_size_km: DEFAULT_BIN_SIZE_KM,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            value_max_price: DEFAULT_VALUE_MAX_PRICE,
            min_satisfaction: DEFAULT_MIN_SATISFACTION,
            max_satisfaction: DEFAULT_MAX_SATISFACTION,
        }
    }
}

impl ViewThresholds {
    /// Loads thresholds from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading thresholds {path}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn price_distance_filter(&self) -> ListingFilter {
        ListingFilter::price_distance(self.max_distance_km)
    }

    pub fn value_matrix_filter(&self) -> ListingFilter {
        ListingFilter::value_matrix(
            self.value_max_price,
            self.min_satisfaction,
            self.max_satisfaction,
        )
    }
}
