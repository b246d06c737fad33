//! Activation detection: which campaign is live "now", which ones still owe
//! their newsletter, and the weekly re-arm rule for rolling campaigns.
//!
//! All window tests truncate to `YYYY-MM-DD` strings and compare
//! lexicographically; the format is fixed-width, so string order matches
//! chronological order, and time-of-day never influences activation.

use chrono::{DateTime, Utc};

use crate::campaign::Campaign;

/// Days an infinite campaign stays quiet after a send before it may re-fire.
pub const RESET_AFTER_DAYS: i64 = 7;

/// Date-only form used for every window comparison.
pub fn date_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn is_active(campaign: &Campaign, today: &str) -> bool {
    let start = date_key(campaign.start_date);
    let end = date_key(campaign.end_date);
    start.as_str() <= today && today <= end.as_str()
}

/// The first campaign in list order whose window covers `now`, if any.
/// Overlapping windows have no precedence beyond list order.
pub fn find_active(campaigns: &[Campaign], now: DateTime<Utc>) -> Option<&Campaign> {
    let today = date_key(now);
    campaigns.iter().find(|c| is_active(c, &today))
}

/// Active, complete, and not yet notified.
pub fn needs_notification(campaign: &Campaign, now: DateTime<Utc>) -> bool {
    campaign.is_complete()
        && !campaign.auto_newsletter_sent
        && is_active(campaign, &date_key(now))
}

pub fn find_needing_notification(campaigns: &[Campaign], now: DateTime<Utc>) -> Vec<&Campaign> {
    campaigns
        .iter()
        .filter(|c| needs_notification(c, now))
        .collect()
}

/// Whether the rolling-campaign reset applies: infinite, notified more than
/// [`RESET_AFTER_DAYS`] ago, and active again right now.
pub fn reset_due(campaign: &Campaign, now: DateTime<Utc>) -> bool {
    if !campaign.is_infinite || !campaign.auto_newsletter_sent {
        return false;
    }
    let Some(sent_at) = campaign.news_letter_sent_at else {
        return false;
    };
    is_active(campaign, &date_key(now)) && (now - sent_at).num_days() > RESET_AFTER_DAYS
}

/// Clear the sent flag on every campaign the reset rule covers, in place.
/// Returns the names of the re-armed campaigns.
pub fn apply_infinite_resets(campaigns: &mut [Campaign], now: DateTime<Utc>) -> Vec<String> {
    let mut rearmed = Vec::new();
    for campaign in campaigns.iter_mut() {
        if reset_due(campaign, now) {
            campaign.auto_newsletter_sent = false;
            campaign.news_letter_sent_at = None;
            rearmed.push(campaign.name.clone());
        }
    }
    rearmed
}
