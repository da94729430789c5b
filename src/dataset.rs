//! Typed model for the rental-listing datasets.
//!
//! Each source file holds the listings of one [`City`] for one [`Period`];
//! parsing turns its rows into [`ListingRecord`]s tagged with that provenance.

use anyhow::{Result, anyhow};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The ten cities covered by the datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum City {
    Amsterdam,
    Athens,
    Barcelona,
    Berlin,
    Budapest,
    Lisbon,
    London,
    Paris,
    Rome,
    Vienna,
}

impl City {
    pub const ALL: [City; 10] = [
        City::Amsterdam,
        City::Athens,
        City::Barcelona,
        City::Berlin,
        City::Budapest,
        City::Lisbon,
        City::London,
        City::Paris,
        City::Rome,
        City::Vienna,
    ];

    /// Lowercase name used in source file names, e.g. `amsterdam`.
    pub fn slug(self) -> &'static str {
        match self {
            City::Amsterdam => "amsterdam",
            City::Athens => "athens",
            City::Barcelona => "barcelona",
            City::Berlin => "berlin",
            City::Budapest => "budapest",
            City::Lisbon => "lisbon",
            City::London => "london",
            City::Paris => "paris",
            City::Rome => "rome",
            City::Vienna => "vienna",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            City::Amsterdam => "Amsterdam",
            City::Athens => "Athens",
            City::Barcelona => "Barcelona",
            City::Berlin => "Berlin",
            City::Budapest => "Budapest",
            City::Lisbon => "Lisbon",
            City::London => "London",
            City::Paris => "Paris",
            City::Rome => "Rome",
            City::Vienna => "Vienna",
        }
    }

    /// Country name as it appears in the boundary features the map joins on.
    pub fn country(self) -> &'static str {
        match self {
            City::Amsterdam => "Netherlands",
            City::Athens => "Greece",
            City::Barcelona => "Spain",
            City::Berlin => "Germany",
            City::Budapest => "Hungary",
            City::Lisbon => "Portugal",
            City::London => "United Kingdom",
            City::Paris => "France",
            City::Rome => "Italy",
            City::Vienna => "Austria",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        City::ALL
            .into_iter()
            .find(|c| c.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow!("unknown city: {s}"))
    }
}

/// Whether a listing was observed on weekdays or over the weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekdays,
    Weekends,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::Weekdays, Period::Weekends];

    pub fn from_weekend(is_weekend: bool) -> Self {
        if is_weekend {
            Period::Weekends
        } else {
            Period::Weekdays
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Period::Weekends)
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Period::Weekdays => "weekdays",
            Period::Weekends => "weekends",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One logical dataset: a city observed over one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DatasetId {
    pub city: City,
    pub period: Period,
}

impl DatasetId {
    pub fn new(city: City, period: Period) -> Self {
        Self { city, period }
    }

    /// Source file name, e.g. `amsterdam_weekdays.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.city.slug(), self.period.suffix())
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.city, self.period)
    }
}

/// Classification of the free-text `room_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoomType {
    EntireHome,
    PrivateRoom,
    SharedRoom,
}

impl RoomType {
    /// Classifies a raw label such as `Entire home/apt`.
    pub fn classify(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("entire") {
            Some(RoomType::EntireHome)
        } else if label.contains("private") {
            Some(RoomType::PrivateRoom)
        } else if label.contains("shared") {
            Some(RoomType::SharedRoom)
        } else {
            None
        }
    }
}

/// One rental listing observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRecord {
    pub price: f64,
    pub distance_km: f64,
    pub guest_satisfaction: Option<f64>,
    pub room_type: String,
    pub bedrooms: u32,
    pub is_superhost: bool,
    pub city: City,
    pub period: Period,
}

impl ListingRecord {
    pub fn is_weekend(&self) -> bool {
        self.period.is_weekend()
    }

    pub fn room_kind(&self) -> Option<RoomType> {
        RoomType::classify(&self.room_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_from_str_is_case_insensitive() {
        assert_eq!("LONDON".parse::<City>().unwrap(), City::London);
        assert_eq!(" vienna ".parse::<City>().unwrap(), City::Vienna);
        assert!("Oslo".parse::<City>().is_err());
    }

    #[test]
    fn test_city_country_mapping() {
        assert_eq!(City::London.country(), "United Kingdom");
        assert_eq!(City::Amsterdam.country(), "Netherlands");
    }

    #[test]
    fn test_dataset_file_name() {
        let id = DatasetId::new(City::Budapest, Period::Weekends);
        assert_eq!(id.file_name(), "budapest_weekends.csv");
        assert_eq!(id.to_string(), "Budapest/weekends");
    }

    #[test]
    fn test_room_type_classify() {
        assert_eq!(
            RoomType::classify("Entire home/apt"),
            Some(RoomType::EntireHome)
        );
        assert_eq!(RoomType::classify("Private room"), Some(RoomType::PrivateRoom));
        assert_eq!(RoomType::classify("Shared room"), Some(RoomType::SharedRoom));
        assert_eq!(RoomType::classify("Hotel"), None);
    }

    #[test]
    fn test_period_from_weekend() {
        assert_eq!(Period::from_weekend(true), Period::Weekends);
        assert!(!Period::from_weekend(false).is_weekend());
    }
}
