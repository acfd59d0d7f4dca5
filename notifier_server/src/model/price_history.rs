//! In-memory price history with per-day aggregation and file persistence.
//!
//! The ingestion job appends `PriceSample`s; the dispatcher's aggregate source reduces the
//! samples of one local calendar day into an `AggregateSnapshot`. Only today and
//! yesterday are ever queried, so older samples are pruned after each ingestion round.
//!
//! The history can be saved to and restored from a file encoded with `bincode`, so
//! aggregates survive a restart of the server.
use bincode::{Decode, Encode};
use chrono::{Local, NaiveDate, TimeZone};
use log::debug;
use notifier_common::asset::Asset;
use notifier_common::command::Day;
use notifier_common::snapshot::{AggregateSnapshot, Extremes, PriceSample};
use notifier_common::{NotifierError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const FORMAT_VERSION: u32 = 1;

#[derive(Encode, Decode)]
struct StoredHistory {
    version: u32,
    samples: Vec<PriceSample>,
}

/// Append-only list of observed prices.
#[derive(Debug, Default, Clone)]
pub struct PriceHistory {
    samples: Vec<PriceSample>,
}

fn local_date(timestamp_ms: i64) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
}

impl PriceHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append samples.
    pub fn record(&mut self, samples: impl IntoIterator<Item = PriceSample>) {
        self.samples.extend(samples);
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing has been recorded.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Drop samples dated before `date`. Returns how many were removed.
    pub fn prune_before(&mut self, date: NaiveDate) -> usize {
        let before = self.samples.len();
        self.samples
            .retain(|s| local_date(s.timestamp_ms).is_some_and(|d| d >= date));
        before - self.samples.len()
    }

    /// Reduce the samples of `date` into per-asset extremes.
    ///
    /// Fails with `DataUnavailable` when no sample falls on that date.
    pub fn aggregate(&self, date: NaiveDate, day: Day) -> Result<AggregateSnapshot> {
        let mut by_asset: BTreeMap<Asset, Vec<f64>> = BTreeMap::new();
        for sample in &self.samples {
            if local_date(sample.timestamp_ms) == Some(date) {
                by_asset.entry(sample.asset).or_default().push(sample.price);
            }
        }
        if by_asset.is_empty() {
            return Err(NotifierError::data_unavailable(
                day,
                format!("no prices recorded on {}", date),
            ));
        }

        let extremes = by_asset
            .into_iter()
            .filter_map(|(asset, prices)| Extremes::from_prices(asset, prices))
            .collect();
        Ok(AggregateSnapshot {
            day,
            date,
            extremes,
        })
    }

    /// Write the history to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let stored = StoredHistory {
            version: FORMAT_VERSION,
            samples: self.samples.clone(),
        };
        let bytes = bincode::encode_to_vec(&stored, bincode::config::standard())?;
        fs::write(path, bytes)?;
        debug!("Saved {} samples to {}", self.samples.len(), path.display());
        Ok(())
    }

    /// Read a history previously written by [`Self::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let (stored, _): (StoredHistory, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard())?;
        if stored.version != FORMAT_VERSION {
            return Err(NotifierError::Format(format!(
                "unsupported history version {}",
                stored.version
            )));
        }
        Ok(PriceHistory {
            samples: stored.samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(date: NaiveDate, hour: u32) -> i64 {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
            .earliest()
            .unwrap()
            .timestamp_millis()
    }

    fn sample(asset: Asset, price: f64, timestamp_ms: i64) -> PriceSample {
        PriceSample {
            asset,
            price,
            timestamp_ms,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn aggregates_only_the_requested_date() {
        let today = day(2024, 3, 2);
        let yesterday = today - Duration::days(1);
        let mut history = PriceHistory::new();
        history.record([
            sample(Asset::BTC, 100.0, at(today, 9)),
            sample(Asset::BTC, 110.0, at(today, 12)),
            sample(Asset::BTC, 105.0, at(today, 15)),
            sample(Asset::ETH, 50.0, at(today, 10)),
            sample(Asset::BTC, 1.0, at(yesterday, 10)),
        ]);

        let snapshot = history.aggregate(today, Day::Today).unwrap();
        assert_eq!(snapshot.date, today);
        assert_eq!(snapshot.extremes.len(), 2);
        let btc = snapshot.get(Asset::BTC).unwrap();
        assert_eq!((btc.min, btc.max), (100.0, 110.0));
        assert!((btc.percent - 10.0).abs() < 1e-9);
        let eth = snapshot.get(Asset::ETH).unwrap();
        assert_eq!(eth.percent, 0.0);
    }

    #[test]
    fn empty_day_is_data_unavailable() {
        let history = PriceHistory::new();
        let err = history.aggregate(day(2024, 3, 2), Day::Yesterday).unwrap_err();
        assert!(matches!(
            err,
            NotifierError::DataUnavailable { day: Day::Yesterday, .. }
        ));
    }

    #[test]
    fn prunes_samples_before_cutoff() {
        let today = day(2024, 3, 5);
        let mut history = PriceHistory::new();
        history.record([
            sample(Asset::BTC, 1.0, at(today - Duration::days(3), 12)),
            sample(Asset::BTC, 2.0, at(today - Duration::days(1), 12)),
            sample(Asset::BTC, 3.0, at(today, 12)),
        ]);
        assert_eq!(history.prune_before(today - Duration::days(1)), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn save_and_load_preserve_samples() {
        let path = std::env::temp_dir().join(format!(
            "notifier-history-{}-{}.bin",
            std::process::id(),
            line!()
        ));
        let today = day(2024, 3, 2);
        let mut history = PriceHistory::new();
        history.record([sample(Asset::BTC, 42.5, at(today, 8))]);
        history.save(&path).unwrap();

        let loaded = PriceHistory::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.len(), 1);
        let snapshot = loaded.aggregate(today, Day::Today).unwrap();
        assert_eq!(snapshot.get(Asset::BTC).unwrap().max, 42.5);
    }

    #[test]
    fn load_rejects_garbage() {
        let path = std::env::temp_dir().join(format!(
            "notifier-garbage-{}-{}.bin",
            std::process::id(),
            line!()
        ));
        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        let result = PriceHistory::load(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
