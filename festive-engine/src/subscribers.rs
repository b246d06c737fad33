//! Subscriber management: opt-in, opt-out, and the welcome mail.
//!
//! Subscribers are unique per `(email, shop, subscription type)` and are
//! never deleted, only deactivated, so resubscribing keeps history intact.

use anyhow::Result;
use chrono::{DateTime, Utc};

use festive_core::{Preferences, Subscriber, SubscriptionType};

use crate::collab::{MailSender, OutboundEmail};
use crate::mailcfg::load_mail;
use crate::store::{SettingsStore, keys, load_or_default, save};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    /// A previously deactivated subscriber opted back in.
    Reactivated,
    AlreadySubscribed,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Add a subscriber, defaulting preferences from the subscription type and
/// applying any caller overrides. The welcome mail is best-effort: it goes
/// out only when mail is configured, and its failure never fails the
/// subscription.
pub async fn subscribe(
    store: &dyn SettingsStore,
    mailer: &dyn MailSender,
    shop: &str,
    email: &str,
    kind: SubscriptionType,
    overrides: Option<Preferences>,
    now: DateTime<Utc>,
) -> Result<SubscribeOutcome> {
    let email = normalize_email(email);
    let mut subscribers: Vec<Subscriber> = load_or_default(store, shop, keys::SUBSCRIBERS).await?;

    if let Some(existing) = subscribers
        .iter_mut()
        .find(|s| s.email == email && s.subscription_type == kind)
    {
        if existing.is_active {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        existing.is_active = true;
        existing.subscribed_at = now;
        if let Some(prefs) = overrides {
            existing.preferences = prefs;
        }
        save(store, shop, keys::SUBSCRIBERS, &subscribers).await?;
        tracing::info!(shop, %email, "subscriber reactivated");
        return Ok(SubscribeOutcome::Reactivated);
    }

    subscribers.push(Subscriber {
        email: email.clone(),
        shop_domain: shop.to_string(),
        subscription_type: kind,
        preferences: overrides.unwrap_or_else(|| Preferences::for_type(kind)),
        is_active: true,
        subscribed_at: now,
    });
    save(store, shop, keys::SUBSCRIBERS, &subscribers).await?;
    tracing::info!(shop, %email, "subscriber added");

    send_welcome(store, mailer, shop, &email).await;
    Ok(SubscribeOutcome::Subscribed)
}

async fn send_welcome(store: &dyn SettingsStore, mailer: &dyn MailSender, shop: &str, to: &str) {
    let settings = match load_mail(store, shop).await {
        Ok(Some(settings)) => settings,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(shop, error = %e, "could not load mail settings for welcome");
            return;
        }
    };
    let email = OutboundEmail {
        from_name: settings.from_name.clone(),
        from_email: settings.from_email.clone(),
        to: to.to_string(),
        subject: format!("Welcome to {shop} updates"),
        html: format!(
            "<p>Thanks for subscribing! We'll let you know about festival \
             offers and news from {shop}.</p>"
        ),
    };
    if let Err(e) = mailer.send(&email).await {
        tracing::warn!(shop, to, error = %e, "welcome mail failed");
    }
}

/// Deactivate every subscription the email holds with the shop. Returns how
/// many records were flipped.
pub async fn unsubscribe(store: &dyn SettingsStore, shop: &str, email: &str) -> Result<usize> {
    let email = normalize_email(email);
    let mut subscribers: Vec<Subscriber> = load_or_default(store, shop, keys::SUBSCRIBERS).await?;
    let mut flipped = 0;
    for s in subscribers.iter_mut() {
        if s.email == email && s.is_active {
            s.is_active = false;
            flipped += 1;
        }
    }
    if flipped > 0 {
        save(store, shop, keys::SUBSCRIBERS, &subscribers).await?;
        tracing::info!(shop, %email, flipped, "unsubscribed");
    }
    Ok(flipped)
}
