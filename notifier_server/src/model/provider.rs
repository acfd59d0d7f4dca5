//! Market data provider response format.
//!
//! The provider's "quotes latest" endpoint returns one object per requested coin id, each
//! carrying prices converted into one or more fiat currencies:
//!
//! ```json
//! {"data": {"1": {"name": "Bitcoin", "symbol": "BTC",
//!                 "last_updated": "2024-03-02T10:00:00.000Z",
//!                 "quote": {"RUB": {"price": 5600000.0, "percent_change_1h": 0.1}}}}}
//! ```
//!
//! Only the fields the notifier needs are modelled; everything else is ignored.
use chrono::{DateTime, Utc};
use log::debug;
use notifier_common::asset::Asset;
use notifier_common::snapshot::PriceSample;
use notifier_common::{NotifierError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Top-level response body.
#[derive(Debug, Deserialize)]
pub struct QuotesResponse {
    /// Coins keyed by provider id.
    pub data: HashMap<String, CoinQuote>,
}

/// One coin entry.
#[derive(Debug, Deserialize)]
pub struct CoinQuote {
    /// Display name, e.g. `Bitcoin`.
    pub name: String,
    /// Ticker symbol, e.g. `BTC`.
    pub symbol: String,
    /// Provider-side update time.
    pub last_updated: Option<DateTime<Utc>>,
    /// Prices keyed by currency code.
    pub quote: HashMap<String, CurrencyValue>,
}

/// Price and change figures in one currency.
#[derive(Debug, Deserialize)]
pub struct CurrencyValue {
    /// Current price.
    pub price: f64,
    /// Percent change over the last hour.
    #[serde(default)]
    pub percent_change_1h: f64,
    /// Percent change over the last 24 hours.
    #[serde(default)]
    pub percent_change_24h: f64,
    /// Percent change over the last 7 days.
    #[serde(default)]
    pub percent_change_7d: f64,
    /// Percent change over the last 30 days.
    #[serde(default)]
    pub percent_change_30d: f64,
}

impl QuotesResponse {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Convert every tracked coin's price in `currency` into samples stamped with
    /// `fetched_at`. Coins whose symbol is not a tracked asset are skipped.
    pub fn into_samples(self, currency: &str, fetched_at: DateTime<Utc>) -> Result<Vec<PriceSample>> {
        let mut samples = Vec::new();
        for (id, coin) in self.data {
            let Ok(asset) = coin.symbol.parse::<Asset>() else {
                debug!("Skipping untracked coin {} ({}, id {})", coin.name, coin.symbol, id);
                continue;
            };
            let value = coin.quote.get(currency).ok_or_else(|| {
                NotifierError::Format(format!("{} has no {} quote", coin.symbol, currency))
            })?;
            debug!(
                "{} {:.2} {} (1h {:+.2}%, 24h {:+.2}%, 7d {:+.2}%, 30d {:+.2}%, updated {:?})",
                coin.symbol,
                value.price,
                currency,
                value.percent_change_1h,
                value.percent_change_24h,
                value.percent_change_7d,
                value.percent_change_30d,
                coin.last_updated,
            );
            samples.push(PriceSample {
                asset,
                price: value.price,
                timestamp_ms: fetched_at.timestamp_millis(),
            });
        }
        samples.sort_by_key(|s| s.asset);
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "status": {"error_code": 0},
        "data": {
            "1": {"name": "Bitcoin", "symbol": "BTC", "last_updated": "2024-03-02T10:00:00.000Z",
                  "quote": {"RUB": {"price": 5600000.5, "percent_change_1h": 0.12,
                                     "percent_change_24h": -1.5, "percent_change_7d": 3.0,
                                     "percent_change_30d": 12.25}}},
            "1027": {"name": "Ethereum", "symbol": "ETH", "last_updated": "2024-03-02T10:00:00.000Z",
                     "quote": {"RUB": {"price": 310000.0}}},
            "74": {"name": "Dogecoin", "symbol": "DOGE", "quote": {"RUB": {"price": 12.0}}}
        }
    }"#;

    #[test]
    fn maps_tracked_coins_to_samples() {
        let fetched_at = Utc::now();
        let samples = QuotesResponse::from_json(BODY)
            .unwrap()
            .into_samples("RUB", fetched_at)
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].asset, Asset::BTC);
        assert_eq!(samples[0].price, 5600000.5);
        assert_eq!(samples[1].asset, Asset::ETH);
        assert_eq!(samples[1].timestamp_ms, fetched_at.timestamp_millis());
    }

    #[test]
    fn missing_currency_is_a_format_error() {
        let err = QuotesResponse::from_json(BODY)
            .unwrap()
            .into_samples("USD", Utc::now())
            .unwrap_err();
        assert!(matches!(err, NotifierError::Format(_)));
    }

    #[test]
    fn malformed_body_is_rejected() {
        assert!(QuotesResponse::from_json(r#"{"data": 3}"#).is_err());
    }
}
