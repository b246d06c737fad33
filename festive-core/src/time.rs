//! Time helpers: shop-local calendar dates for whole-day window checks.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// The calendar date "now" in an IANA timezone like "Asia/Kolkata". Window
/// checks are whole-day, so the merchant's local date is the one that counts.
pub fn local_today(now_utc: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now_utc.with_timezone(&tz).date_naive())
}

/// Human-readable date for newsletter copy, e.g. "14 March 2026".
pub fn display_date(at: DateTime<Utc>) -> String {
    at.format("%-d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kolkata_is_ahead_of_utc() {
        // 20:00 UTC is already the next day at UTC+5:30.
        let now = Utc.with_ymd_and_hms(2026, 2, 20, 20, 0, 0).unwrap();
        let today = local_today(now, "Asia/Kolkata").unwrap();
        assert_eq!(today, NaiveDate::from_ymd_opt(2026, 2, 21).unwrap());
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        let now = Utc::now();
        assert!(local_today(now, "Not/AZone").is_err());
    }

    #[test]
    fn display_date_is_unpadded() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(display_date(at), "4 March 2026");
    }
}
