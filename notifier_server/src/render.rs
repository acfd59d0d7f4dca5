//! Message texts sent to subscribers.
//!
//! Numbers use Rust's own formatting with two fixed decimals, independent of any locale.
use chrono::NaiveDate;
use notifier_common::snapshot::Extremes;
use notifier_common::Day;

/// Reply to `start`.
pub const GREETING: &str = "Hi, I am the crypto price bot. Send /btc or /eth for today's \
     figures, /btc_y or /eth_y for yesterday's, and add a number of minutes to change how \
     often I report, e.g. /btc 5.";

/// Reply to `stop`.
pub const FAREWELL: &str = "Bot stopped. Send /start to subscribe again.";

/// Reply to anything the router did not recognise.
pub const UNKNOWN_COMMAND: &str = "I don't know that command yet.";

/// Render one asset's figures for `day`.
pub fn report(extremes: &Extremes, day: Day, date: NaiveDate) -> String {
    format!(
        "{} ({}) for {} {}:\n Change: {:.2}%\n Min: {:.2}\n Max: {:.2}",
        extremes.asset.name(),
        extremes.asset,
        day,
        date.format("%m/%d/%Y"),
        extremes.percent,
        extremes.min,
        extremes.max,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_common::Asset;

    #[test]
    fn report_uses_fixed_precision() {
        let extremes = Extremes {
            asset: Asset::BTC,
            min: 100.0,
            max: 110.0,
            percent: 10.0,
        };
        let text = report(
            &extremes,
            Day::Yesterday,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        assert_eq!(
            text,
            "Bitcoin (BTC) for yesterday 03/01/2024:\n Change: 10.00%\n Min: 100.00\n Max: 110.00"
        );
    }

    #[test]
    fn report_rounds_long_fractions() {
        let extremes = Extremes {
            asset: Asset::ETH,
            min: 3000.123456,
            max: 3100.987654,
            percent: 3.3621,
        };
        let text = report(&extremes, Day::Today, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(text.contains("3000.12"));
        assert!(text.contains("3100.99"));
        assert!(text.contains("3.36%"));
    }
}
