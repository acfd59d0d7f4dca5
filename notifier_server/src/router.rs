//! Command router.
//!
//! Turns a command token plus optional argument into a [`Routed`] command. The argument,
//! when present, is a delivery interval in minutes and must be a finite, non-negative
//! number; anything else is rejected with `InvalidInterval` so the caller can answer with
//! [`INTERVAL_FORMAT_HINT`] and leave the subscriber untouched.
use notifier_common::{Command, NotifierError, Result};
use std::time::Duration;

/// Reply sent when an interval argument does not parse.
pub const INTERVAL_FORMAT_HINT: &str =
    "Invalid command format: enter the interval as a number of minutes, e.g. /btc 5";

/// Smallest tick accepted from a subscriber; shorter requests are clamped up.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Outcome of routing one chat command.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    /// Parsed command, `Command::Unknown` for unrecognised tokens.
    pub command: Command,
    /// Interval override requested with the command.
    pub interval: Option<Duration>,
}

/// Parses subscriber commands.
#[derive(Debug, Clone)]
pub struct Router {
    min_interval: Duration,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(MIN_INTERVAL)
    }
}

impl Router {
    /// Router clamping interval overrides to at least `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    /// Route `token` with its optional `argument`.
    pub fn route(&self, token: &str, argument: Option<&str>) -> Result<Routed> {
        let interval = argument.map(|arg| self.parse_interval(arg)).transpose()?;
        Ok(Routed {
            command: Command::from_token(token),
            interval,
        })
    }

    fn parse_interval(&self, argument: &str) -> Result<Duration> {
        let minutes: f64 = argument
            .trim()
            .parse()
            .map_err(|_| NotifierError::InvalidInterval(argument.to_string()))?;
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(NotifierError::InvalidInterval(argument.to_string()));
        }
        let interval = Duration::try_from_secs_f64(minutes * 60.0)
            .map_err(|_| NotifierError::InvalidInterval(argument.to_string()))?;
        Ok(interval.max(self.min_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_common::{Asset, Day};

    #[test]
    fn routes_command_without_argument() {
        let routed = Router::default().route("report_a", None).unwrap();
        assert_eq!(routed.command, Command::report(Asset::BTC, Day::Today));
        assert_eq!(routed.interval, None);
    }

    #[test]
    fn argument_is_minutes() {
        let routed = Router::default().route("/eth", Some("5")).unwrap();
        assert_eq!(routed.interval, Some(Duration::from_secs(300)));

        let routed = Router::default().route("/eth", Some("0.5")).unwrap();
        assert_eq!(routed.interval, Some(Duration::from_secs(30)));
    }

    #[test]
    fn tiny_interval_is_clamped() {
        let routed = Router::default().route("btc", Some("0")).unwrap();
        assert_eq!(routed.interval, Some(MIN_INTERVAL));
    }

    #[test]
    fn rejects_malformed_intervals() {
        let router = Router::default();
        for bad in ["five", "-1", "NaN", "inf", "1e300", ""] {
            assert!(
                matches!(
                    router.route("btc", Some(bad)),
                    Err(NotifierError::InvalidInterval(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_token_is_not_an_error() {
        let routed = Router::default().route("/moon", Some("2")).unwrap();
        assert_eq!(routed.command, Command::Unknown("/moon".to_string()));
        assert_eq!(routed.interval, Some(Duration::from_secs(120)));
    }
}
