//! Duplicate suppression for the per-shop campaign list.
//!
//! Two layers with different strictness: the stored-record cleanup keys on
//! the full `(offer, start, end, name)` tuple, while the write-time guard is
//! deliberately more aggressive (same offer OR same window OR anything
//! created in the last few minutes) to block near-duplicate creation races.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::activation::date_key;
use crate::campaign::Campaign;

/// Window in which any prior creation blocks another one.
pub const CREATION_GUARD_MINUTES: i64 = 10;

fn identity_key(c: &Campaign) -> String {
    format!(
        "{}_{}_{}_{}",
        c.offer,
        date_key(c.start_date),
        date_key(c.end_date),
        c.name
    )
}

/// Drop later occurrences of any repeated identity key. First wins.
/// Idempotent: running it twice equals running it once.
pub fn dedupe(campaigns: Vec<Campaign>) -> Vec<Campaign> {
    let mut seen = HashSet::new();
    campaigns
        .into_iter()
        .filter(|c| seen.insert(identity_key(c)))
        .collect()
}

/// Write-time guard for a proposed new campaign. Matches on the offer alone,
/// on the whole-day date window, or on any existing record created within
/// [`CREATION_GUARD_MINUTES`] of `now`.
pub fn is_near_duplicate(
    existing: &[Campaign],
    offer: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    let start_key = date_key(start);
    let end_key = date_key(end);
    existing.iter().any(|c| {
        let same_offer = c.offer == offer;
        let same_window = date_key(c.start_date) == start_key && date_key(c.end_date) == end_key;
        let recent = c
            .created_at
            .map(|at| now - at < Duration::minutes(CREATION_GUARD_MINUTES))
            .unwrap_or(false);
        same_offer || same_window || recent
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, d, 10, 0, 0).unwrap()
    }

    fn campaign(name: &str, offer: &str, start: u32, end: u32) -> Campaign {
        Campaign::new(name, offer, "ABCD25", at(start), at(end))
    }

    #[test]
    fn first_occurrence_wins() {
        let keep = campaign("Onam", "25% OFF", 1, 5);
        let drop = campaign("Onam", "25% OFF", 1, 5);
        let other = campaign("Rath Yatra", "10% OFF", 10, 12);

        let out = dedupe(vec![keep.clone(), drop, other.clone()]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, keep.id);
        assert_eq!(out[1].id, other.id);
    }

    #[test]
    fn key_includes_all_four_fields() {
        let a = campaign("Onam", "25% OFF", 1, 5);
        let mut b = campaign("Onam", "25% OFF", 1, 5);
        b.name = "Onam Harvest".into();
        // Different name, same offer and window: cleanup keeps both.
        assert_eq!(dedupe(vec![a, b]).len(), 2);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let list = vec![
            campaign("Onam", "25% OFF", 1, 5),
            campaign("Onam", "25% OFF", 1, 5),
            campaign("Bihu", "30% OFF", 2, 6),
        ];
        let once = dedupe(list);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn guard_blocks_same_offer_even_with_new_window() {
        let existing = vec![campaign("Onam", "25% OFF", 1, 5).with_created_at(at(1))];
        assert!(is_near_duplicate(&existing, "25% OFF", at(20), at(25), at(28)));
    }

    #[test]
    fn guard_blocks_same_window_with_new_offer() {
        let existing = vec![campaign("Onam", "25% OFF", 1, 5).with_created_at(at(1))];
        assert!(is_near_duplicate(&existing, "40% OFF", at(1), at(5), at(28)));
    }

    #[test]
    fn guard_blocks_any_recent_creation() {
        let now = at(28);
        let recent =
            campaign("Onam", "25% OFF", 1, 5).with_created_at(now - Duration::minutes(5));
        assert!(is_near_duplicate(&[recent], "99% OFF", at(20), at(21), now));
    }

    #[test]
    fn guard_passes_distinct_campaign_outside_window() {
        let now = at(28);
        let old = campaign("Onam", "25% OFF", 1, 5).with_created_at(now - Duration::hours(2));
        assert!(!is_near_duplicate(&[old], "40% OFF", at(20), at(21), now));
    }
}
