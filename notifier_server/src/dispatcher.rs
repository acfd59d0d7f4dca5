//! Notification dispatcher.
//!
//! A single loop multiplexes three sources with crossbeam `select!`:
//!
//! - the shutdown channel; a message or a disconnect ends the loop,
//! - inbound subscriber commands, applied to the [`Registry`] one at a time in arrival order,
//! - a repeating tick, which triggers a sweep over every registered subscriber.
//!
//! A sweep works on a snapshot of the registry taken when it begins. Commands that arrive
//! while it runs wait in the channel until the loop is idle again. Deliveries within a
//! sweep are sequential; a slow client delays the rest of that tick.
//!
//! The tick interval is shared by all subscribers. When a command changes it, the ticker is
//! rebuilt and the next sweep happens one new interval later.
//!
//! Failures never stop the loop: a bad interval argument gets a format hint back, missing
//! data skips the delivery that needed it, and a failed delivery evicts the subscriber
//! according to the [`DeliveryPolicy`].
use crate::registry::Registry;
use crate::render;
use crate::router::{Router, INTERVAL_FORMAT_HINT};
use crate::source::AggregateSource;
use crate::transport::{InboundEvent, Transport};
use clap::ValueEnum;
use crossbeam_channel::{never, select, tick, Receiver, TryRecvError};
use log::{debug, info, warn};
use notifier_common::snapshot::AggregateSnapshot;
use notifier_common::{Command, Day, NotifierError, Result, SubscriberId};
use std::collections::HashSet;
use strum_macros::Display;

/// What to do when a delivery fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Remove the subscriber after the first failed send.
    #[default]
    Evict,
    /// Retry the send once, then remove the subscriber.
    RetryOnce,
}

impl DeliveryPolicy {
    fn attempts(self) -> usize {
        match self {
            DeliveryPolicy::Evict => 1,
            DeliveryPolicy::RetryOnce => 2,
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    /// Messages delivered.
    pub delivered: usize,
    /// Deliveries skipped because their data was unavailable.
    pub skipped: usize,
    /// Subscribers removed after a failed delivery.
    pub evicted: Vec<SubscriberId>,
}

/// Today/yesterday snapshots fetched lazily, at most once per sweep each.
struct SweepData<'a, S: AggregateSource> {
    source: &'a S,
    today: Option<Option<AggregateSnapshot>>,
    yesterday: Option<Option<AggregateSnapshot>>,
}

impl<'a, S: AggregateSource> SweepData<'a, S> {
    fn new(source: &'a S) -> Self {
        Self {
            source,
            today: None,
            yesterday: None,
        }
    }

    fn snapshot(&mut self, day: Day) -> Result<&AggregateSnapshot> {
        let slot = match day {
            Day::Today => &mut self.today,
            Day::Yesterday => &mut self.yesterday,
        };
        let source = self.source;
        slot.get_or_insert_with(|| match source.snapshot(day) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Aggregates for {} unavailable this tick: {}", day, e);
                None
            }
        })
        .as_ref()
        .ok_or_else(|| NotifierError::data_unavailable(day, "aggregate source failed"))
    }

    /// Render the message `command` resolves to.
    fn resolve(&mut self, command: &Command) -> Result<String> {
        match command {
            Command::Start => Ok(render::GREETING.to_string()),
            Command::Report { asset, day } => {
                let snapshot = self.snapshot(*day)?;
                let extremes = snapshot
                    .get(*asset)
                    .ok_or(NotifierError::AssetNotFound(*asset))?;
                Ok(render::report(extremes, *day, snapshot.date))
            }
            Command::Stop => Ok(render::FAREWELL.to_string()),
            Command::Unknown(_) => Ok(render::UNKNOWN_COMMAND.to_string()),
        }
    }
}

fn deliver<T: Transport>(
    transport: &mut T,
    policy: DeliveryPolicy,
    id: &SubscriberId,
    text: &str,
) -> Result<()> {
    let mut attempt = 1;
    loop {
        match transport.send(id, text) {
            Ok(()) => return Ok(()),
            Err(e) if attempt < policy.attempts() => {
                debug!("Delivery to {} failed (attempt {}): {}, retrying", id, attempt, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// What woke the loop up.
enum Wake {
    Cancelled,
    Command(InboundEvent),
    InboundClosed,
    Tick,
}

fn is_cancelled(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

/// The scheduling loop and the state it owns.
pub struct Dispatcher<S, T> {
    registry: Registry,
    router: Router,
    source: S,
    transport: T,
    policy: DeliveryPolicy,
    /// Ids that sent `stop` and nothing since.
    stopped: HashSet<SubscriberId>,
}

impl<S: AggregateSource, T: Transport> Dispatcher<S, T> {
    /// Build a dispatcher owning `registry`; its tick interval seeds the loop.
    pub fn new(
        registry: Registry,
        router: Router,
        source: S,
        transport: T,
        policy: DeliveryPolicy,
    ) -> Self {
        Self {
            registry,
            router,
            source,
            transport,
            policy,
            stopped: HashSet::new(),
        }
    }

    /// The subscriber registry.
    #[cfg(test)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The current shared tick interval.
    #[cfg(test)]
    pub fn tick_interval(&self) -> std::time::Duration {
        self.registry.tick_interval()
    }

    /// The outbound transport.
    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until `shutdown` receives a message or disconnects.
    ///
    /// Cancellation is checked before waiting, after a command arrives and before a sweep
    /// starts, so no command is applied and no sweep begins once it has been observed. A
    /// delivery already in flight is allowed to finish.
    pub fn run(&mut self, events: &Receiver<InboundEvent>, shutdown: &Receiver<()>) {
        let mut interval = self.registry.tick_interval();
        let mut ticker = tick(interval);
        let mut inbound = events.clone();
        info!("Dispatcher started, tick every {:?}", interval);

        loop {
            if is_cancelled(shutdown) {
                break;
            }
            let wake = select! {
                recv(shutdown) -> _ => Wake::Cancelled,
                recv(inbound) -> msg => match msg {
                    Ok(event) => Wake::Command(event),
                    Err(_) => Wake::InboundClosed,
                },
                recv(ticker) -> _ => Wake::Tick,
            };

            match wake {
                Wake::Cancelled => break,
                Wake::Command(event) => {
                    if is_cancelled(shutdown) {
                        break;
                    }
                    self.handle_event(event);
                    if self.registry.tick_interval() != interval {
                        interval = self.registry.tick_interval();
                        ticker = tick(interval);
                        info!("Tick interval changed to {:?}", interval);
                    }
                }
                Wake::InboundClosed => {
                    warn!("Inbound command stream closed; continuing with sweeps only");
                    inbound = never();
                }
                Wake::Tick => {
                    if is_cancelled(shutdown) {
                        break;
                    }
                    let report = self.sweep();
                    info!(
                        "Sweep done: {} delivered, {} skipped, {} evicted, {} subscribers left",
                        report.delivered,
                        report.skipped,
                        report.evicted.len(),
                        self.registry.len()
                    );
                }
            }
        }
        info!("Dispatcher stopped with {} subscribers", self.registry.len());
    }

    /// Apply one inbound command.
    pub fn handle_event(&mut self, event: InboundEvent) {
        let InboundEvent {
            subscriber,
            command,
            argument,
        } = event;

        let routed = match self.router.route(&command, argument.as_deref()) {
            Ok(routed) => routed,
            Err(e) => {
                warn!("Rejected command from {}: {}", subscriber, e);
                if let Err(e) = self.transport.send(&subscriber, INTERVAL_FORMAT_HINT) {
                    warn!("Failed to send format hint to {}: {}", subscriber, e);
                }
                return;
            }
        };

        match routed.command {
            Command::Stop => self.unsubscribe(&subscriber),
            command => {
                debug!("{} -> {} (interval {:?})", subscriber, command, routed.interval);
                self.stopped.remove(&subscriber);
                if self.registry.upsert(subscriber.clone(), command, routed.interval) {
                    info!("New subscriber {}", subscriber);
                }
            }
        }
    }

    /// Remove `id` if registered, say goodbye and tell the transport to stop receiving
    /// from it.
    ///
    /// An id that was never registered is stopped too. A repeated `stop` with no other
    /// command in between is ignored.
    fn unsubscribe(&mut self, id: &SubscriberId) {
        let was_registered = self.registry.remove(id).is_some();
        if !self.stopped.insert(id.clone()) {
            debug!("Ignoring repeated stop from {}", id);
            return;
        }
        if let Err(e) = self.transport.send(id, render::FAREWELL) {
            warn!("Failed to send farewell to {}: {}", id, e);
        }
        self.transport.stop_receiving(id);
        if was_registered {
            info!("Subscriber {} stopped", id);
        } else {
            info!("Stopped {} before it subscribed", id);
        }
    }

    /// Deliver the current message of every registered subscriber.
    pub fn sweep(&mut self) -> SweepReport {
        let entries = self.registry.entries();
        let mut data = SweepData::new(&self.source);
        let mut report = SweepReport::default();

        for (id, command) in entries {
            let text = match data.resolve(&command) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {} for {}: {}", command, id, e);
                    report.skipped += 1;
                    continue;
                }
            };
            match deliver(&mut self.transport, self.policy, &id, &text) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Delivery to {} failed, removing subscriber: {}", id, e);
                    self.registry.remove(&id);
                    report.evicted.push(id);
                }
            }
        }
        report
    }
}
