//! Crypto price notification server.
//!
//! Chat clients subscribe over TCP with commands such as `/btc` or `/eth_y 5`, and the
//! server pushes each subscriber's current report to it over UDP on a shared tick.
//! The binary wires together these building blocks:
//!
//! - `Ingestion` polls a `PriceFeed` (the provider's HTTP API, a saved provider response,
//!   or a synthetic random walk) and keeps today's and yesterday's samples in a shared
//!   `PriceHistory`.
//! - `ChatReceiver` accepts one TCP connection per client, parses JSON chat lines and
//!   forwards them as `InboundEvent`s over a crossbeam channel.
//! - `UdpPingListener` refreshes client keep-alives in the `PingMonitor`.
//! - `Dispatcher` owns the subscriber registry, applies commands in arrival order and
//!   sweeps all subscribers on every tick through the UDP `ChatTransport`.
//!
//! Shutdown: Ctrl-C drops the only shutdown sender. Every worker selects on (or polls) a
//! receiver of that channel, so the disconnect stops them all. The price history is saved
//! afterwards when `--history-file` is set.
#![warn(missing_docs)]
use crate::args::Args;
use crate::dispatcher::Dispatcher;
use crate::ingestion::Ingestion;
use crate::model::feed::{PriceFeed, ProviderFileFeed, ProviderHttpFeed, RandomWalkFeed};
use crate::model::ping_monitor::PingMonitor;
use crate::model::price_history::PriceHistory;
use crate::receiver::ChatReceiver;
use crate::registry::Registry;
use crate::router::Router;
use crate::source::StoreSource;
use crate::transport::{ChatTransport, InboundEvent, RouteTable};
use crate::udp_listener::UdpPingListener;
use clap::Parser;
use crossbeam_channel::unbounded;
use log::{error, info, warn};
use notifier_common::net::addr;
use notifier_common::{NotifierError, Result};
use std::net::UdpSocket;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

mod args;
mod dispatcher;
mod ingestion;
pub mod model;
mod receiver;
mod registry;
mod render;
mod router;
mod source;
mod transport;
mod udp_listener;

fn main() -> Result<(), NotifierError> {
    init_logger();
    let args = Args::parse();

    let history = Arc::new(Mutex::new(load_history(args.history_file.as_deref())));

    let (shutdown_tx, shutdown_rx) = unbounded::<()>();
    let mut shutdown_tx = Some(shutdown_tx);
    ctrlc::set_handler(move || {
        if shutdown_tx.take().is_some() {
            info!("Shutdown requested");
        }
    })
    .map_err(|e| NotifierError::Format(format!("failed to install Ctrl-C handler: {}", e)))?;

    let udp_socket = Arc::new(UdpSocket::bind(addr(&args.bind_ip, args.data_port))?);
    info!("UDP socket created on: {}", udp_socket.local_addr()?);

    let routes = Arc::new(Mutex::new(RouteTable::new()));
    let ping_monitor = Arc::new(Mutex::new(PingMonitor::new(Duration::from_secs(
        args.keepalive_secs,
    ))));

    let ping_handle = UdpPingListener::start(
        Arc::clone(&udp_socket),
        Arc::clone(&ping_monitor),
        shutdown_rx.clone(),
    )?;

    let (event_tx, event_rx) = unbounded::<InboundEvent>();
    let tcp_receiver = ChatReceiver::new(
        &addr(&args.bind_ip, args.command_port),
        Arc::clone(&routes),
        Arc::clone(&ping_monitor),
    )?;
    thread::spawn(move || {
        if let Err(e) = tcp_receiver.receive_loop(event_tx) {
            error!("Receiver loop failed: {}", e);
        }
    });

    let feed: Box<dyn PriceFeed> = match (&args.provider_url, &args.quotes_file) {
        (Some(url), _) => {
            info!("Fetching {} quotes from {}", args.currency, url);
            let api_key = args.api_key.as_deref().unwrap_or_default();
            Box::new(ProviderHttpFeed::new(url, api_key, &args.currency)?)
        }
        (None, Some(path)) => {
            info!("Reading {} quotes from {}", args.currency, path.display());
            Box::new(ProviderFileFeed::new(path.clone(), &args.currency))
        }
        (None, None) => {
            info!("Using the synthetic random-walk price feed");
            Box::new(RandomWalkFeed::new())
        }
    };
    let ingestion_handle = Ingestion::start(
        feed,
        Arc::clone(&history),
        Duration::from_secs(args.fetch_interval_secs),
        shutdown_rx.clone(),
    );

    let mut dispatcher = Dispatcher::new(
        Registry::new(Duration::from_secs(args.interval_secs)),
        Router::default(),
        StoreSource::new(Arc::clone(&history)),
        ChatTransport::new(udp_socket, routes, ping_monitor),
        args.delivery_policy,
    );
    info!("Delivery policy: {}", args.delivery_policy);
    dispatcher.run(&event_rx, &shutdown_rx);

    if ingestion_handle.join().is_err() {
        error!("Ingestion thread panicked");
    }
    if ping_handle.join().is_err() {
        error!("Ping listener thread panicked");
    }

    if let Some(path) = &args.history_file {
        history.lock()?.save(path)?;
        info!("Price history saved to {}", path.display());
    }
    info!("Server stopped");
    Ok(())
}

fn load_history(path: Option<&Path>) -> PriceHistory {
    let Some(path) = path.filter(|p| p.exists()) else {
        return PriceHistory::new();
    };
    match PriceHistory::load(path) {
        Ok(history) => {
            info!("Loaded {} price samples from {}", history.len(), path.display());
            history
        }
        Err(e) => {
            warn!("Starting with empty history, {} unreadable: {}", path.display(), e);
            PriceHistory::new()
        }
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
