//! Price feeds polled by the ingestion job.
//!
//! - `RandomWalkFeed` synthesizes prices with a small random walk around the last value,
//!   seeded from each asset's base price. Useful for demos and local runs.
//! - `ProviderHttpFeed` calls the provider's "quotes latest" endpoint with the API key
//!   header on every fetch.
//! - `ProviderFileFeed` re-reads a saved "quotes latest" response from disk on every
//!   fetch; handy for offline runs against a recorded fixture.
use crate::model::provider::QuotesResponse;
use chrono::Utc;
use log::debug;
use notifier_common::asset::Asset;
use notifier_common::snapshot::PriceSample;
use notifier_common::{NotifierError, Result};
use rand::Rng;
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use strum::IntoEnumIterator;

/// Upper bound for one provider request, connect to last byte.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Source of fresh price samples.
pub trait PriceFeed: Send {
    /// Fetch one round of samples, one per available asset.
    fn fetch(&mut self) -> Result<Vec<PriceSample>>;
}

/// Synthetic feed walking each price by up to ±1% per fetch.
pub struct RandomWalkFeed {
    current_prices: HashMap<Asset, f64>,
}

impl Default for RandomWalkFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomWalkFeed {
    /// Start every asset at its base price.
    pub fn new() -> Self {
        Self {
            current_prices: Asset::iter().map(|a| (a, a.base_price())).collect(),
        }
    }

    /// Calculate the next synthetic price, clamped to stay positive.
    pub fn next_price(current_price: f64) -> f64 {
        let mut rng = rand::rng();
        let change: f64 = rng.random_range(-0.01..0.01);
        let new_price = current_price * (1.0 + change);
        new_price.max(0.01)
    }
}

impl PriceFeed for RandomWalkFeed {
    fn fetch(&mut self) -> Result<Vec<PriceSample>> {
        let timestamp_ms = Utc::now().timestamp_millis();
        let samples = Asset::iter()
            .map(|asset| {
                let current = self
                    .current_prices
                    .entry(asset)
                    .or_insert_with(|| asset.base_price());
                *current = Self::next_price(*current);
                PriceSample {
                    asset,
                    price: *current,
                    timestamp_ms,
                }
            })
            .collect();
        Ok(samples)
    }
}

/// Feed reading a provider response file.
pub struct ProviderFileFeed {
    path: PathBuf,
    currency: String,
}

impl ProviderFileFeed {
    /// Read quotes in `currency` from `path` on each fetch.
    pub fn new(path: PathBuf, currency: &str) -> Self {
        Self {
            path,
            currency: currency.to_string(),
        }
    }
}

impl PriceFeed for ProviderFileFeed {
    fn fetch(&mut self) -> Result<Vec<PriceSample>> {
        let body = fs::read_to_string(&self.path)?;
        QuotesResponse::from_json(&body)?.into_samples(&self.currency, Utc::now())
    }
}

/// Feed calling the provider's HTTP API.
pub struct ProviderHttpFeed {
    client: Client,
    url: String,
    currency: String,
}

impl ProviderHttpFeed {
    /// Query `url` with `api_key`, reading prices in `currency`.
    pub fn new(url: &str, api_key: &str, currency: &str) -> Result<Self> {
        Self::with_builder(Client::builder(), url, api_key, currency)
    }

    fn with_builder(
        builder: ClientBuilder,
        url: &str,
        api_key: &str,
        currency: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            API_KEY_HEADER,
            api_key
                .parse()
                .map_err(|_| NotifierError::Format("invalid API key".to_string()))?,
        );

        let client = builder
            .timeout(FETCH_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| NotifierError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            currency: currency.to_string(),
        })
    }
}

impl PriceFeed for ProviderHttpFeed {
    fn fetch(&mut self) -> Result<Vec<PriceSample>> {
        let response = self.client.get(&self.url).send().map_err(|e| {
            if e.is_timeout() {
                NotifierError::Fetch(format!("timed out after {:?}", FETCH_TIMEOUT))
            } else {
                NotifierError::Fetch(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Fetch(format!("provider answered {}", status)));
        }
        let body = response
            .text()
            .map_err(|e| NotifierError::Fetch(format!("failed to read body: {}", e)))?;
        debug!("Fetched {} bytes from {}", body.len(), self.url);

        QuotesResponse::from_json(&body)?.into_samples(&self.currency, Utc::now())
    }
}
