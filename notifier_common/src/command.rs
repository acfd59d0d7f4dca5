//! Subscriber commands understood by the notifier.
//!
//! A chat line such as `/btc_y 5` is split into a command token (`btc_y`) and an
//! optional argument (`5`). The token maps to a closed [`Command`] enum; the argument is
//! interpreted by the server's router as a delivery interval in minutes.
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

use crate::asset::Asset;

/// Calendar day an aggregate report refers to.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq,
)]
#[strum(serialize_all = "lowercase")]
pub enum Day {
    /// The current local date.
    Today,
    /// The local date before today.
    Yesterday,
}

/// Command a subscriber has asked for.
///
/// `Unknown` is the sentinel for unrecognized tokens. It is not an error: the subscriber
/// is registered and receives a fixed "unknown command" reply on each tick.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub enum Command {
    /// Greeting, no data lookup.
    Start,
    /// Min/max/percent-change report for one asset on one day.
    Report {
        /// Asset to report on.
        asset: Asset,
        /// Day the aggregate covers.
        day: Day,
    },
    /// Farewell and unsubscribe.
    Stop,
    /// Anything the router did not recognise; keeps the raw token for logging.
    Unknown(String),
}

impl Command {
    /// Map a command token to a `Command`.
    ///
    /// A leading `/` is ignored and matching is case-insensitive. Both the short
    /// (`btc`, `eth_y`) and the long (`report_a`, `report_b_yesterday`) spellings are
    /// accepted.
    pub fn from_token(token: &str) -> Command {
        let token = token.trim();
        let normalized = token.trim_start_matches('/').to_ascii_lowercase();
        match normalized.as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "btc" | "report_a" => Command::report(Asset::BTC, Day::Today),
            "btc_y" | "report_a_yesterday" => Command::report(Asset::BTC, Day::Yesterday),
            "eth" | "report_b" => Command::report(Asset::ETH, Day::Today),
            "eth_y" | "report_b_yesterday" => Command::report(Asset::ETH, Day::Yesterday),
            _ => Command::Unknown(token.to_string()),
        }
    }

    /// Shorthand for a `Report` command.
    pub fn report(asset: Asset, day: Day) -> Command {
        Command::Report { asset, day }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Report { asset, day: Day::Today } => {
                write!(f, "{}", asset.to_string().to_lowercase())
            }
            Command::Report { asset, day: Day::Yesterday } => {
                write!(f, "{}_y", asset.to_string().to_lowercase())
            }
            Command::Unknown(token) => write!(f, "{}", token),
        }
    }
}

/// Split a raw chat line into its command token and optional argument.
///
/// Returns `None` for blank lines. Everything after the first whitespace run is the
/// argument, trimmed; an empty remainder is treated as no argument.
pub fn split_command_line(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((token, rest)) => {
            let rest = rest.trim();
            Some((token, (!rest.is_empty()).then_some(rest)))
        }
        None => Some((line, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_short_and_long_tokens() {
        assert_eq!(Command::from_token("/btc"), Command::report(Asset::BTC, Day::Today));
        assert_eq!(Command::from_token("report_a"), Command::report(Asset::BTC, Day::Today));
        assert_eq!(
            Command::from_token("ETH_Y"),
            Command::report(Asset::ETH, Day::Yesterday)
        );
        assert_eq!(
            Command::from_token("report_b_yesterday"),
            Command::report(Asset::ETH, Day::Yesterday)
        );
        assert_eq!(Command::from_token("/start"), Command::Start);
        assert_eq!(Command::from_token("stop"), Command::Stop);
    }

    #[test]
    fn unrecognised_token_is_the_unknown_sentinel() {
        assert_eq!(
            Command::from_token("/doge"),
            Command::Unknown("/doge".to_string())
        );
    }

    #[test]
    fn display_round_trips_through_from_token() {
        let commands = [
            Command::Start,
            Command::Stop,
            Command::report(Asset::BTC, Day::Today),
            Command::report(Asset::ETH, Day::Yesterday),
        ];
        for command in commands {
            assert_eq!(Command::from_token(&command.to_string()), command);
        }
    }

    #[test]
    fn splits_token_and_argument() {
        assert_eq!(split_command_line("/btc 5"), Some(("/btc", Some("5"))));
        assert_eq!(split_command_line("  eth_y   2.5  "), Some(("eth_y", Some("2.5"))));
        assert_eq!(split_command_line("start"), Some(("start", None)));
        assert_eq!(split_command_line("   "), None);
    }
}
