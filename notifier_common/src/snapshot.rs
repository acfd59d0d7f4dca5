//! Price samples and per-day aggregates.
//!
//! A `PriceSample` is one observed price for one asset. The server's price history groups
//! samples by local calendar day and reduces them into `Extremes`: minimum, maximum and
//! the percent spread between them. An `AggregateSnapshot` holds the extremes of every
//! asset that had samples on a given day.
use bincode::{Decode, Encode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::command::Day;

/// One observed price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Encode, Decode, PartialEq)]
pub struct PriceSample {
    /// Asset the price belongs to.
    pub asset: Asset,
    /// Observed price.
    pub price: f64,
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp_ms: i64,
}

/// Min/max/percent-change of one asset over one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Extremes {
    /// Asset the figures belong to.
    pub asset: Asset,
    /// Lowest observed price.
    pub min: f64,
    /// Highest observed price.
    pub max: f64,
    /// `(max - min) / min * 100`, or 0 when `min` is 0.
    pub percent: f64,
}

impl Extremes {
    /// Reduce a non-empty set of prices. Returns `None` when `prices` is empty.
    pub fn from_prices(asset: Asset, prices: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut iter = prices.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        let percent = if min == 0.0 { 0.0 } else { (max - min) / min * 100.0 };
        Some(Extremes {
            asset,
            min,
            max,
            percent,
        })
    }
}

/// Extremes of every tracked asset for one day. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateSnapshot {
    /// Which day relative to now.
    pub day: Day,
    /// The calendar date covered.
    pub date: NaiveDate,
    /// One entry per asset that had samples; sorted by asset.
    pub extremes: Vec<Extremes>,
}

impl AggregateSnapshot {
    /// Figures for `asset`, if it had samples.
    pub fn get(&self, asset: Asset) -> Option<&Extremes> {
        self.extremes.iter().find(|e| e.asset == asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_prices_to_extremes() {
        let ext = Extremes::from_prices(Asset::BTC, [105.0, 100.0, 110.0]).unwrap();
        assert_eq!(ext.min, 100.0);
        assert_eq!(ext.max, 110.0);
        assert!((ext.percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn empty_prices_have_no_extremes() {
        assert!(Extremes::from_prices(Asset::ETH, Vec::new()).is_none());
    }

    #[test]
    fn zero_minimum_yields_zero_percent() {
        let ext = Extremes::from_prices(Asset::ETH, [0.0, 5.0]).unwrap();
        assert_eq!(ext.percent, 0.0);
    }

    #[test]
    fn looks_up_asset() {
        let snapshot = AggregateSnapshot {
            day: Day::Today,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            extremes: vec![Extremes::from_prices(Asset::ETH, [1.0]).unwrap()],
        };
        assert!(snapshot.get(Asset::ETH).is_some());
        assert!(snapshot.get(Asset::BTC).is_none());
    }
}
