//! Command-line arguments for the notifier server.
use crate::dispatcher::DeliveryPolicy;
use clap::Parser;
use notifier_common::net::{COMMAND_PORT, DATA_PORT};
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to bind the chat command (TCP) and delivery (UDP) sockets on.
    #[clap(long, default_value = "0.0.0.0")]
    pub bind_ip: String,

    /// TCP port for incoming chat commands.
    #[clap(long, default_value_t = COMMAND_PORT)]
    pub command_port: u16,

    /// UDP port for deliveries and keep-alive pings.
    #[clap(long, default_value_t = DATA_PORT)]
    pub data_port: u16,

    /// Initial tick interval in seconds; subscribers can override it in minutes.
    #[clap(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// How often prices are fetched, in seconds.
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_interval_secs: u64,

    /// Seconds without a PING after which a client counts as unreachable.
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub keepalive_secs: u64,

    /// What to do when a delivery fails.
    #[clap(long, value_enum, default_value_t = DeliveryPolicy::Evict)]
    pub delivery_policy: DeliveryPolicy,

    /// Provider "quotes latest" endpoint to fetch live prices from.
    #[clap(long, requires = "api_key", conflicts_with = "quotes_file")]
    pub provider_url: Option<String>,

    /// API key sent with every provider request.
    #[clap(long)]
    pub api_key: Option<String>,

    /// Read prices from a saved provider "quotes latest" JSON file instead of the synthetic feed.
    #[clap(long)]
    pub quotes_file: Option<PathBuf>,

    /// Currency to read from provider quotes.
    #[clap(long, default_value = "USD")]
    pub currency: String,

    /// File the price history is loaded from at start-up and saved to on shutdown.
    #[clap(long)]
    pub history_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_network_constants() {
        let args = Args::parse_from(["notifier_server"]);
        assert_eq!(args.command_port, COMMAND_PORT);
        assert_eq!(args.data_port, DATA_PORT);
        assert_eq!(args.interval_secs, 20);
        assert_eq!(args.delivery_policy, DeliveryPolicy::Evict);
        assert!(args.quotes_file.is_none());
        assert!(args.provider_url.is_none());
    }

    #[test]
    fn rejects_zero_intervals() {
        for flag in ["--interval-secs", "--fetch-interval-secs", "--keepalive-secs"] {
            assert!(
                Args::try_parse_from(["notifier_server", flag, "0"]).is_err(),
                "{flag} 0 should be rejected"
            );
        }
        let args = Args::parse_from(["notifier_server", "--interval-secs", "1"]);
        assert_eq!(args.interval_secs, 1);
    }

    #[test]
    fn provider_url_needs_api_key() {
        let url = "https://example.com/v1/cryptocurrency/quotes/latest";
        assert!(Args::try_parse_from(["notifier_server", "--provider-url", url]).is_err());

        let args =
            Args::try_parse_from(["notifier_server", "--provider-url", url, "--api-key", "k"])
                .unwrap();
        assert_eq!(args.provider_url.as_deref(), Some(url));
        assert_eq!(args.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn parses_retry_policy() {
        let args = Args::parse_from(["notifier_server", "--delivery-policy", "retry-once"]);
        assert_eq!(args.delivery_policy, DeliveryPolicy::RetryOnce);
    }
}
