//! Aggregate source consumed by the dispatcher.
use crate::model::price_history::PriceHistory;
use chrono::{Days, Local, NaiveDate};
use notifier_common::snapshot::AggregateSnapshot;
use notifier_common::{Day, NotifierError, Result};
use std::sync::{Arc, Mutex};

/// Provider of per-asset min/max/percent-change for today and yesterday.
///
/// Errors mean "data unavailable"; the dispatcher skips the deliveries that need the
/// missing day and carries on.
pub trait AggregateSource {
    /// Aggregates for the current local date.
    fn today(&self) -> Result<AggregateSnapshot>;
    /// Aggregates for the previous local date.
    fn yesterday(&self) -> Result<AggregateSnapshot>;

    /// Aggregates for `day`.
    fn snapshot(&self, day: Day) -> Result<AggregateSnapshot> {
        match day {
            Day::Today => self.today(),
            Day::Yesterday => self.yesterday(),
        }
    }
}

/// Aggregate source reading the shared price history.
#[derive(Clone)]
pub struct StoreSource {
    history: Arc<Mutex<PriceHistory>>,
}

impl StoreSource {
    /// Wrap the history written by the ingestion job.
    pub fn new(history: Arc<Mutex<PriceHistory>>) -> Self {
        Self { history }
    }

    fn aggregate_on(&self, date: NaiveDate, day: Day) -> Result<AggregateSnapshot> {
        let history = self.history.lock()?;
        history.aggregate(date, day)
    }
}

impl AggregateSource for StoreSource {
    fn today(&self) -> Result<AggregateSnapshot> {
        self.aggregate_on(Local::now().date_naive(), Day::Today)
    }

    fn yesterday(&self) -> Result<AggregateSnapshot> {
        let yesterday = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| NotifierError::data_unavailable(Day::Yesterday, "date out of range"))?;
        self.aggregate_on(yesterday, Day::Yesterday)
    }
}
