//! The series each dashboard chart renders, built from loaded records.

use anyhow::anyhow;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::aggregate::{
    AggregateBucket, Aggregation, BucketKey, BucketOrder, GroupBy, ListingPredicate, Reduction,
    mean, sort_buckets,
};
use crate::config::ViewThresholds;
use crate::dataset::{City, DatasetId, ListingRecord, Period};
use crate::filter::ListingFilter;

/// Mean price per distance bin, ascending by distance.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn price_distance_series(
    records: &[ListingRecord],
    thresholds: &ViewThresholds,
) -> Vec<AggregateBucket> {
    let accepted = thresholds.price_distance_filter().apply(records);
    let series = Aggregation::new(
        GroupBy::DistanceBin {
            bin_size: thresholds.bin_size_km,
        },
        Reduction::MeanPrice,
    )
    .run(&accepted);

    debug!(accepted = accepted.len(), bins = series.len(), "Price/distance series built");
    series
}

/// Listings plotted on the price vs guest satisfaction scatter.
pub fn value_matrix_points(
    records: &[ListingRecord],
    thresholds: &ViewThresholds,
) -> Vec<ListingRecord> {
    thresholds.value_matrix_filter().apply(records)
}

/// One bar of the superhost comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SuperhostBar {
    pub superhost: bool,
    pub period: Period,
    /// Mean of the per-city mean prices.
    pub value: f64,
    pub sample_count: usize,
    /// Per-city mean prices, highest first.
    pub cities: Vec<AggregateBucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuperhostComparison {
    pub bars: Vec<SuperhostBar>,
}

/// Mean price by host class and period, with a per-city breakdown.
///
/// Bars come in the order non-superhost weekdays, non-superhost weekends,
/// superhost weekdays, superhost weekends. Every city with a dataset in
/// `loaded` takes part, even when none of its listings survives the filter;
/// a city with no accepted listings in a cell contributes a zero mean.
#[tracing::instrument(skip_all, fields(records = records.len(), loaded = loaded.len()))]
pub fn superhost_comparison(
    records: &[ListingRecord],
    loaded: &[DatasetId],
) -> SuperhostComparison {
    let accepted = ListingFilter::standard().apply(records);
    let by_cell = Aggregation::new(GroupBy::HostPeriod, Reduction::MeanPrice).with_empty();

    let mut bars: Vec<SuperhostBar> = by_cell
        .run(&[])
        .into_iter()
        .filter_map(|b| match b.key {
            BucketKey::HostPeriod { superhost, period } => Some(SuperhostBar {
                superhost,
                period,
                value: 0.0,
                sample_count: 0,
                cities: Vec::new(),
            }),
            _ => None,
        })
        .collect();

    for city in City::ALL {
        if !loaded.iter().any(|d| d.city == city) {
            continue;
        }
        let city_records: Vec<ListingRecord> =
            accepted.iter().filter(|r| r.city == city).cloned().collect();

        for (bar, cell) in bars.iter_mut().zip(by_cell.run(&city_records)) {
            bar.sample_count += cell.sample_count;
            bar.cities.push(AggregateBucket {
                key: BucketKey::City { city },
                value: cell.value,
                sample_count: cell.sample_count,
            });
        }
    }

    for bar in &mut bars {
        let city_means: Vec<f64> = bar.cities.iter().map(|c| c.value).collect();
        bar.value = mean(&city_means);
        sort_buckets(&mut bar.cities, BucketOrder::Descending);
    }

    SuperhostComparison { bars }
}

/// The per-city statistics shown on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Mean nightly price.
    Cost,
    /// Share of entire-home listings, in percent.
    Family,
    /// Median distance to the city centre, in km.
    Dist,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cost, Metric::Family, Metric::Dist];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Cost => "Cost of Living",
            Metric::Family => "Family-Friendly",
            Metric::Dist => "Distance to City Center",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Metric::Cost => "Average price per night",
            Metric::Family => "Percentage of entire home/apt listings",
            Metric::Dist => "Median distance to city center (km)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Cost => "cost",
            Metric::Family => "family",
            Metric::Dist => "dist",
        })
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let wanted = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow!("unknown metric: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityMetric {
    pub city: City,
    pub country: &'static str,
    pub value: f64,
    pub sample_count: usize,
}

/// One value per city for `metric`, covering all ten cities.
///
/// Cities without usable listings report `0.0` with a zero `sample_count`.
#[tracing::instrument(skip(records), fields(records = records.len()))]
pub fn city_metrics(
    records: &[ListingRecord],
    metric: Metric,
    order: BucketOrder,
) -> Vec<CityMetric> {
    let (input, reduction) = match metric {
        Metric::Cost => (ListingFilter::standard().apply(records), Reduction::MeanPrice),
        Metric::Family => (
            records.to_vec(),
            Reduction::Percentage(ListingPredicate::entire_home()),
        ),
        Metric::Dist => (
            records
                .iter()
                .filter(|r| r.distance_km > 0.0)
                .cloned()
                .collect(),
            Reduction::MedianDistance,
        ),
    };

    Aggregation::new(GroupBy::City, reduction)
        .with_empty()
        .ordered(order)
        .run(&input)
        .into_iter()
        .filter_map(|b| match b.key {
            BucketKey::City { city } => Some(CityMetric {
                city,
                country: city.country(),
                value: b.value,
                sample_count: b.sample_count,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(
        city: City,
        period: Period,
        superhost: bool,
        price: f64,
        distance_km: f64,
    ) -> ListingRecord {
        ListingRecord {
            price,
            distance_km,
            guest_satisfaction: Some(90.0),
            room_type: "Private room".to_string(),
            bedrooms: 1,
            is_superhost: superhost,
            city,
            period,
        }
    }

    #[test]
    fn test_price_distance_series_drops_far_and_free_listings() {
        let records = vec![
            listing(City::Paris, Period::Weekdays, false, 100.0, 0.2),
            listing(City::Paris, Period::Weekdays, false, 300.0, 0.4),
            listing(City::Paris, Period::Weekdays, false, 0.0, 0.4),
            listing(City::Paris, Period::Weekdays, false, 90.0, 6.9),
            listing(City::Paris, Period::Weekdays, false, 50.0, 7.5),
        ];
        let series = price_distance_series(&records, &ViewThresholds::default());

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, BucketKey::DistanceBin { km: 0.0 });
        assert_eq!(series[0].value, 200.0);
        assert_eq!(series[1].key, BucketKey::DistanceBin { km: 6.5 });
    }

    #[test]
    fn test_value_matrix_points() {
        let mut unhappy = listing(City::Rome, Period::Weekends, false, 100.0, 1.0);
        unhappy.guest_satisfaction = Some(40.0);
        let records = vec![
            listing(City::Rome, Period::Weekdays, false, 150.0, 1.0),
            listing(City::Rome, Period::Weekdays, false, 2500.0, 1.0),
            unhappy,
        ];
        let points = value_matrix_points(&records, &ViewThresholds::default());

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].price, 150.0);
    }

    #[test]
    fn test_superhost_comparison() {
        let records = vec![
            listing(City::Athens, Period::Weekdays, false, 100.0, 1.0),
            listing(City::Athens, Period::Weekdays, false, 200.0, 1.0),
            listing(City::Athens, Period::Weekends, true, 400.0, 1.0),
            listing(City::London, Period::Weekdays, false, 500.0, 1.0),
            listing(City::London, Period::Weekends, true, 600.0, 1.0),
        ];
        let loaded = [
            DatasetId::new(City::Athens, Period::Weekdays),
            DatasetId::new(City::Athens, Period::Weekends),
            DatasetId::new(City::London, Period::Weekdays),
            DatasetId::new(City::London, Period::Weekends),
        ];
        let comparison = superhost_comparison(&records, &loaded);

        assert_eq!(comparison.bars.len(), 4);
        let first = &comparison.bars[0];
        assert!(!first.superhost);
        assert_eq!(first.period, Period::Weekdays);
        // Athens 150, London 500
        assert_eq!(first.value, 325.0);
        assert_eq!(first.sample_count, 3);
        assert_eq!(first.cities[0].key, BucketKey::City { city: City::London });
        assert_eq!(first.cities[1].value, 150.0);

        let superhost_weekdays = &comparison.bars[2];
        assert!(superhost_weekdays.superhost);
        assert_eq!(superhost_weekdays.value, 0.0);
        assert!(superhost_weekdays.cities.iter().all(|c| c.is_empty()));

        let superhost_weekends = &comparison.bars[3];
        assert_eq!(superhost_weekends.value, 500.0);
    }

    #[test]
    fn test_superhost_comparison_counts_loaded_city_without_priced_listings() {
        let records = vec![
            listing(City::Rome, Period::Weekdays, false, 100.0, 1.0),
            listing(City::Paris, Period::Weekdays, false, 0.0, 1.0),
        ];
        let loaded = [
            DatasetId::new(City::Rome, Period::Weekdays),
            DatasetId::new(City::Paris, Period::Weekdays),
            // header only
            DatasetId::new(City::Berlin, Period::Weekends),
        ];
        let comparison = superhost_comparison(&records, &loaded);

        let first = &comparison.bars[0];
        assert_eq!(first.cities.len(), 3);
        assert!((first.value - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(first.sample_count, 1);
        for city in [City::Paris, City::Berlin] {
            let cell = first
                .cities
                .iter()
                .find(|c| c.key == BucketKey::City { city })
                .unwrap();
            assert!(cell.is_empty());
        }
    }

    #[test]
    fn test_superhost_comparison_empty() {
        let comparison = superhost_comparison(&[], &[]);
        assert_eq!(comparison.bars.len(), 4);
        assert!(comparison.bars.iter().all(|b| b.value == 0.0 && b.cities.is_empty()));
    }

    #[test]
    fn test_city_metrics_cover_all_cities() {
        let mut entire = listing(City::Berlin, Period::Weekdays, false, 120.0, 2.0);
        entire.room_type = "Entire home/apt".to_string();
        let records = vec![
            entire,
            listing(City::Berlin, Period::Weekdays, false, 80.0, 4.0),
            listing(City::Vienna, Period::Weekends, false, 60.0, 0.0),
        ];

        let cost = city_metrics(&records, Metric::Cost, BucketOrder::Descending);
        assert_eq!(cost.len(), 10);
        assert_eq!(cost[0].city, City::Berlin);
        assert_eq!(cost[0].value, 100.0);
        assert_eq!(cost[0].country, "Germany");
        assert_eq!(cost[1].city, City::Vienna);
        assert!(cost[2..].iter().all(|m| m.sample_count == 0 && m.value == 0.0));

        let family = city_metrics(&records, Metric::Family, BucketOrder::Discovery);
        let berlin = family.iter().find(|m| m.city == City::Berlin).unwrap();
        assert_eq!(berlin.value, 50.0);

        let dist = city_metrics(&records, Metric::Dist, BucketOrder::Ascending);
        let vienna = dist.iter().find(|m| m.city == City::Vienna).unwrap();
        assert_eq!(vienna.sample_count, 0);
        let berlin = dist.iter().find(|m| m.city == City::Berlin).unwrap();
        assert_eq!(berlin.value, 3.0);
        assert_eq!(dist.last().unwrap().city, City::Berlin);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Family".parse::<Metric>().unwrap(), Metric::Family);
        assert!("rent".parse::<Metric>().is_err());
        assert_eq!(Metric::Dist.label(), "Distance to City Center");
    }
}
