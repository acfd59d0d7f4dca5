//! Periodic fetch-and-persist job.
//!
//! `Ingestion::start` runs a background thread that polls a `PriceFeed` on a fixed tick,
//! appends the samples to the shared `PriceHistory` and prunes everything older than
//! yesterday. A failed fetch is logged and not retried; the next tick simply tries again,
//! and the dispatcher sees the gap as "data unavailable".
use crate::model::feed::PriceFeed;
use crate::model::price_history::PriceHistory;
use chrono::{Days, Local};
use crossbeam_channel::{select, tick, Receiver};
use log::{debug, error, info, warn};
use notifier_common::{Day, Result};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Background ingestion job.
pub struct Ingestion;

impl Ingestion {
    /// Fetch one round from `feed` into `history`. Returns the number of samples stored.
    pub fn run_once(feed: &mut dyn PriceFeed, history: &Mutex<PriceHistory>) -> Result<usize> {
        let samples = feed.fetch()?;
        let count = samples.len();

        let today = Local::now().date_naive();
        let mut history = history.lock()?;
        history.record(samples);
        if let Some(yesterday) = today.checked_sub_days(Days::new(1)) {
            let pruned = history.prune_before(yesterday);
            if pruned > 0 {
                debug!("Pruned {} samples older than {}", pruned, yesterday);
            }
        }
        if let Ok(snapshot) = history.aggregate(today, Day::Today) {
            for ext in &snapshot.extremes {
                debug!(
                    "{} today: min {:.2}, max {:.2}, change {:.2}%",
                    ext.asset, ext.min, ext.max, ext.percent
                );
            }
        }
        Ok(count)
    }

    /// Start the ingestion thread. It fetches immediately, then every `interval`, until
    /// `shutdown` disconnects.
    pub fn start(
        mut feed: Box<dyn PriceFeed>,
        history: Arc<Mutex<PriceHistory>>,
        interval: Duration,
        shutdown: Receiver<()>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("Ingestion started, fetching every {:?}", interval);
            let ticker = tick(interval);

            loop {
                match Self::run_once(feed.as_mut(), &history) {
                    Ok(count) => debug!("Stored {} price samples", count),
                    Err(e) => warn!("Price fetch failed: {}", e),
                }

                select! {
                    recv(shutdown) -> _ => break,
                    recv(ticker) -> msg => if let Err(e) = msg {
                        error!("Ingestion ticker failed: {}", e);
                        break;
                    },
                }
            }
            info!("Ingestion stopping...");
        })
    }
}
