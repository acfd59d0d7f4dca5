//! Subscriber registry.
//!
//! Maps each subscriber handle to its current command and requested interval. The
//! registry also carries the dispatcher-wide tick interval: an interval override from any
//! subscriber replaces it for everyone (last writer wins). There is a single shared cadence,
//! not one timer per subscriber.
//!
//! The registry is owned by the dispatcher loop thread and is not synchronized.
use notifier_common::{Command, SubscriberId};
use std::collections::HashMap;
use std::time::Duration;

/// Default delivery interval for new subscribers and the initial tick.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(20);

/// A live subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberEntry {
    /// Most recent valid command.
    pub command: Command,
    /// Interval this subscriber last asked for.
    pub interval: Duration,
}

/// In-memory subscriber table plus the shared tick interval.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<SubscriberId, SubscriberEntry>,
    tick_interval: Duration,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl Registry {
    /// Create an empty registry ticking every `tick_interval`.
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            tick_interval,
        }
    }

    /// Insert or replace the entry for `id`.
    ///
    /// An `interval_override` replaces the entry's interval and the shared tick interval.
    /// Without one, an existing entry keeps its interval and a new entry gets the default.
    /// Returns `true` if `id` was not registered before.
    pub fn upsert(
        &mut self,
        id: SubscriberId,
        command: Command,
        interval_override: Option<Duration>,
    ) -> bool {
        if let Some(interval) = interval_override {
            self.tick_interval = interval;
        }
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.command = command;
                if let Some(interval) = interval_override {
                    entry.interval = interval;
                }
                false
            }
            None => {
                let entry = SubscriberEntry {
                    command,
                    interval: interval_override.unwrap_or(DEFAULT_INTERVAL),
                };
                self.entries.insert(id, entry);
                true
            }
        }
    }

    /// Delete the entry for `id`. Removing an absent id is a no-op returning `None`.
    pub fn remove(&mut self, id: &SubscriberId) -> Option<SubscriberEntry> {
        self.entries.remove(id)
    }

    /// Owned snapshot of every (id, command) pair, in no particular order.
    pub fn entries(&self) -> Vec<(SubscriberId, Command)> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.command.clone()))
            .collect()
    }

    /// Entry for `id`, if registered.
    #[cfg(test)]
    pub fn get(&self, id: &SubscriberId) -> Option<&SubscriberEntry> {
        self.entries.get(id)
    }

    /// Whether `id` is registered.
    #[cfg(test)]
    pub fn contains(&self, id: &SubscriberId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is subscribed.
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current shared tick interval.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_common::{Asset, Day};

    fn id(handle: &str) -> SubscriberId {
        SubscriberId::new(handle)
    }

    #[test]
    fn upsert_inserts_then_replaces() {
        let mut registry = Registry::default();
        assert!(registry.upsert(id("1"), Command::Start, None));
        assert!(!registry.upsert(id("1"), Command::report(Asset::BTC, Day::Today), None));

        assert_eq!(registry.len(), 1);
        let entry = registry.get(&id("1")).unwrap();
        assert_eq!(entry.command, Command::report(Asset::BTC, Day::Today));
        assert_eq!(entry.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn interval_override_is_last_writer_wins() {
        let mut registry = Registry::default();
        registry.upsert(id("1"), Command::Start, Some(Duration::from_secs(60)));
        registry.upsert(id("2"), Command::Start, Some(Duration::from_secs(120)));

        assert_eq!(registry.tick_interval(), Duration::from_secs(120));
        assert_eq!(registry.get(&id("1")).unwrap().interval, Duration::from_secs(60));
    }

    #[test]
    fn upsert_without_override_keeps_entry_interval() {
        let mut registry = Registry::default();
        registry.upsert(id("1"), Command::Start, Some(Duration::from_secs(300)));
        registry.upsert(id("1"), Command::Stop, None);
        assert_eq!(registry.get(&id("1")).unwrap().interval, Duration::from_secs(300));
        assert_eq!(registry.tick_interval(), Duration::from_secs(300));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = Registry::default();
        registry.upsert(id("1"), Command::Start, None);
        assert!(registry.remove(&id("1")).is_some());
        assert!(registry.remove(&id("1")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn entries_snapshot_is_detached() {
        let mut registry = Registry::default();
        registry.upsert(id("1"), Command::Start, None);
        registry.upsert(id("2"), Command::Stop, None);

        let mut snapshot = registry.entries();
        registry.remove(&id("1"));
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], (id("1"), Command::Start));
        assert!(!registry.contains(&id("1")));
    }
}
