//! Validity predicates applied before aggregation.

use serde::Serialize;

use crate::dataset::ListingRecord;

pub const DEFAULT_MAX_DISTANCE_KM: f64 = 7.0;
pub const DEFAULT_VALUE_MAX_PRICE: f64 = 2000.0;
pub const DEFAULT_MIN_SATISFACTION: f64 = 60.0;
pub const DEFAULT_MAX_SATISFACTION: f64 = 100.0;

/// The predicates a view applies to its records.
///
/// `price > 0` and a finite, non-negative distance are always required; the optional
/// bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ListingFilter {
    pub max_price: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub satisfaction: Option<(f64, f64)>,
}

impl ListingFilter {
    /// Positive price only.
    pub fn standard() -> Self {
        Self::default()
    }

    pub fn price_distance(max_distance_km: f64) -> Self {
        Self {
            max_distance_km: Some(max_distance_km),
            ..Self::default()
        }
    }

    pub fn value_matrix(max_price: f64, min_satisfaction: f64, max_satisfaction: f64) -> Self {
        Self {
            max_price: Some(max_price),
            satisfaction: Some((min_satisfaction, max_satisfaction)),
            ..Self::default()
        }
    }

    pub fn accepts(&self, record: &ListingRecord) -> bool {
        if !(record.price > 0.0) || !record.distance_km.is_finite() || record.distance_km < 0.0 {
            return false;
        }
        if self.max_price.is_some_and(|max| record.price > max) {
            return false;
        }
        if self
            .max_distance_km
            .is_some_and(|max| record.distance_km > max)
        {
            return false;
        }
        if let Some((lo, hi)) = self.satisfaction {
            match record.guest_satisfaction {
                Some(s) if s >= lo && s <= hi => {}
                _ => return false,
            }
        }
        true
    }

    /// Returns the accepted records in their original order.
    pub fn apply(&self, records: &[ListingRecord]) -> Vec<ListingRecord> {
        records.iter().filter(|r| self.accepts(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{City, Period};

    fn record(price: f64, distance_km: f64, satisfaction: Option<f64>) -> ListingRecord {
        ListingRecord {
            price,
            distance_km,
            guest_satisfaction: satisfaction,
            room_type: "Private room".to_string(),
            bedrooms: 1,
            is_superhost: false,
            city: City::Rome,
            period: Period::Weekdays,
        }
    }

    #[test]
    fn test_non_positive_price_is_always_rejected() {
        let filters = [
            ListingFilter::standard(),
            ListingFilter::price_distance(7.0),
            ListingFilter::value_matrix(2000.0, 60.0, 100.0),
        ];
        for f in filters {
            assert!(!f.accepts(&record(0.0, 1.0, Some(90.0))));
            assert!(!f.accepts(&record(-5.0, 1.0, Some(90.0))));
        }
    }

    #[test]
    fn test_negative_distance_is_rejected() {
        assert!(!ListingFilter::standard().accepts(&record(100.0, -0.5, None)));
        assert!(ListingFilter::standard().accepts(&record(100.0, 0.0, None)));
    }

    #[test]
    fn test_price_distance_cutoff_is_inclusive() {
        let f = ListingFilter::price_distance(7.0);
        assert!(f.accepts(&record(100.0, 7.0, None)));
        assert!(!f.accepts(&record(100.0, 7.01, None)));
    }

    #[test]
    fn test_value_matrix_bounds() {
        let f = ListingFilter::value_matrix(2000.0, 60.0, 100.0);
        assert!(f.accepts(&record(2000.0, 12.0, Some(60.0))));
        assert!(!f.accepts(&record(2000.5, 1.0, Some(90.0))));
        assert!(!f.accepts(&record(100.0, 1.0, Some(59.0))));
        assert!(!f.accepts(&record(100.0, 1.0, None)));
    }

    #[test]
    fn test_apply_preserves_order() {
        let input = vec![
            record(30.0, 1.0, None),
            record(0.0, 1.0, None),
            record(10.0, 2.0, None),
            record(20.0, 3.0, None),
        ];
        let out = ListingFilter::standard().apply(&input);
        let prices: Vec<f64> = out.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![30.0, 10.0, 20.0]);
        assert_eq!(input.len(), 4);
    }
}
