//! Periodic sweeps: the hourly activation pass that dispatches newsletters
//! for newly-active campaigns, and the daily pass that re-arms infinite
//! campaigns a week after their last send.
//!
//! A sweep never aborts on a single shop or campaign; failures are logged
//! and counted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::task::JoinHandle;

use festive_core::{apply_infinite_resets, find_needing_notification};

use crate::collab::{MailSender, TextGenerator};
use crate::newsletter::dispatch;
use crate::store::{SettingsStore, load_popup, save_popup};

pub const ACTIVATION_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const RESET_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub shops: usize,
    pub dispatched: usize,
    pub failures: usize,
}

/// Dispatch newsletters for every campaign of one shop that needs one.
/// Returns how many went out.
pub async fn run_shop_activation(
    store: &dyn SettingsStore,
    mailer: &dyn MailSender,
    text: &dyn TextGenerator,
    shop: &str,
    now: chrono::DateTime<Utc>,
) -> Result<usize> {
    let popup = load_popup(store, shop).await?;
    let due: Vec<_> = find_needing_notification(&popup.festivals, now)
        .into_iter()
        .cloned()
        .collect();

    let mut dispatched = 0;
    for campaign in &due {
        match dispatch(store, mailer, text, shop, campaign, now).await {
            Ok(report) if report.success => dispatched += 1,
            Ok(report) => {
                tracing::warn!(shop, campaign = %campaign.name, message = %report.message,
                    "dispatch unsuccessful");
            }
            Err(e) => {
                tracing::warn!(shop, campaign = %campaign.name, error = %e, "dispatch errored");
            }
        }
    }
    Ok(dispatched)
}

/// The hourly pass over every shop.
pub async fn run_activation_sweep(
    store: &dyn SettingsStore,
    mailer: &dyn MailSender,
    text: &dyn TextGenerator,
    now: chrono::DateTime<Utc>,
) -> Result<SweepSummary> {
    let mut summary = SweepSummary::default();
    for shop in store.shops().await? {
        summary.shops += 1;
        match run_shop_activation(store, mailer, text, &shop, now).await {
            Ok(dispatched) => summary.dispatched += dispatched,
            Err(e) => {
                summary.failures += 1;
                tracing::warn!(shop, error = %e, "activation sweep failed for shop");
            }
        }
    }
    tracing::info!(
        shops = summary.shops,
        dispatched = summary.dispatched,
        failures = summary.failures,
        "activation sweep done"
    );
    Ok(summary)
}

/// The daily pass that clears week-old sent flags on infinite campaigns.
/// Returns how many campaigns were re-armed.
pub async fn run_reset_sweep(store: &dyn SettingsStore, now: chrono::DateTime<Utc>) -> Result<usize> {
    let mut rearmed = 0;
    for shop in store.shops().await? {
        let mut popup = match load_popup(store, &shop).await {
            Ok(popup) => popup,
            Err(e) => {
                tracing::warn!(shop, error = %e, "reset sweep failed for shop");
                continue;
            }
        };
        let names = apply_infinite_resets(&mut popup.festivals, now);
        if names.is_empty() {
            continue;
        }
        rearmed += names.len();
        tracing::info!(shop, rearmed = ?names, "infinite campaigns re-armed");
        save_popup(store, &shop, &popup).await?;
    }
    Ok(rearmed)
}

/// Run both sweeps on their intervals until the tasks are aborted. The first
/// tick of each fires immediately, so a restart catches up right away.
pub fn spawn_schedulers(
    store: Arc<dyn SettingsStore>,
    mailer: Arc<dyn MailSender>,
    text: Arc<dyn TextGenerator>,
) -> Vec<JoinHandle<()>> {
    let activation = {
        let store = store.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(ACTIVATION_INTERVAL);
            loop {
                ticks.tick().await;
                if let Err(e) =
                    run_activation_sweep(store.as_ref(), mailer.as_ref(), text.as_ref(), Utc::now())
                        .await
                {
                    tracing::error!(error = %e, "activation sweep aborted");
                }
            }
        })
    };
    let reset = tokio::spawn(async move {
        let mut ticks = tokio::time::interval(RESET_INTERVAL);
        loop {
            ticks.tick().await;
            if let Err(e) = run_reset_sweep(store.as_ref(), Utc::now()).await {
                tracing::error!(error = %e, "reset sweep aborted");
            }
        }
    });
    vec![activation, reset]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{CollabError, CollabResult, OutboundEmail};
    use crate::mailcfg::{EmailSettings, MailProvider, save_mail};
    use crate::store::{MemStore, keys};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone};
    use festive_core::{Campaign, Preferences, PopupSettings, Subscriber, SubscriptionType};

    struct OkMailer;

    #[async_trait]
    impl MailSender for OkMailer {
        async fn send(&self, _email: &OutboundEmail) -> CollabResult<()> {
            Ok(())
        }
    }

    struct DownText;

    #[async_trait]
    impl TextGenerator for DownText {
        async fn generate(&self, _system: &str, _prompt: &str) -> CollabResult<String> {
            Err(CollabError::Unavailable("down".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 2, 8, 0, 0).unwrap()
    }

    fn active_campaign(name: &str, code: &str) -> Campaign {
        let start = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 9, 0, 0, 0).unwrap();
        Campaign::new(name, "25% OFF", code, start, end)
    }

    async fn seed_shop(store: &MemStore, shop: &str, campaigns: Vec<Campaign>) {
        let mut popup = PopupSettings::default();
        popup.festivals = campaigns;
        save_popup(store, shop, &popup).await.unwrap();

        let settings =
            EmailSettings::new(MailProvider::Gmail, "Demo", "hi@demo.example", "pw", "secret")
                .unwrap();
        save_mail(store, shop, &settings).await.unwrap();

        let sub = Subscriber {
            email: format!("fan@{shop}"),
            shop_domain: shop.to_string(),
            subscription_type: SubscriptionType::Festival,
            preferences: Preferences::for_type(SubscriptionType::Festival),
            is_active: true,
            subscribed_at: now(),
        };
        crate::store::save(store, shop, keys::SUBSCRIBERS, &vec![sub])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sweep_dispatches_once_per_campaign() {
        let store = MemStore::new();
        seed_shop(&store, "a.example", vec![active_campaign("Dussehra", "DUSS25")]).await;
        seed_shop(&store, "b.example", vec![active_campaign("Navratri", "NAVR25")]).await;

        let first = run_activation_sweep(&store, &OkMailer, &DownText, now())
            .await
            .unwrap();
        assert_eq!(first.shops, 2);
        assert_eq!(first.dispatched, 2);
        assert_eq!(first.failures, 0);

        // Flags are set, so the next pass is a no-op.
        let second = run_activation_sweep(&store, &OkMailer, &DownText, now())
            .await
            .unwrap();
        assert_eq!(second.dispatched, 0);
    }

    #[tokio::test]
    async fn one_bad_shop_never_stops_the_sweep() {
        let store = MemStore::new();
        store
            .set("a.example", keys::POPUP, serde_json::json!("not a document"))
            .await
            .unwrap();
        seed_shop(&store, "b.example", vec![active_campaign("Dussehra", "DUSS25")]).await;

        let summary = run_activation_sweep(&store, &OkMailer, &DownText, now())
            .await
            .unwrap();
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.dispatched, 1);
    }

    #[tokio::test]
    async fn unconfigured_mail_counts_as_not_dispatched() {
        let store = MemStore::new();
        let mut popup = PopupSettings::default();
        popup.festivals = vec![active_campaign("Dussehra", "DUSS25")];
        save_popup(&store, "a.example", &popup).await.unwrap();

        let summary = run_activation_sweep(&store, &OkMailer, &DownText, now())
            .await
            .unwrap();
        assert_eq!(summary.dispatched, 0);
        assert_eq!(summary.failures, 0);
    }

    #[tokio::test]
    async fn reset_sweep_rearms_and_persists() {
        let store = MemStore::new();
        let mut infinite = active_campaign("Summer Carnival", "SUCA25").infinite();
        infinite.auto_newsletter_sent = true;
        infinite.news_letter_sent_at = Some(now() - ChronoDuration::days(8));
        let mut finite = active_campaign("Dussehra", "DUSS25");
        finite.auto_newsletter_sent = true;
        finite.news_letter_sent_at = Some(now() - ChronoDuration::days(8));
        seed_shop(&store, "a.example", vec![infinite, finite]).await;

        assert_eq!(run_reset_sweep(&store, now()).await.unwrap(), 1);
        let popup = load_popup(&store, "a.example").await.unwrap();
        assert!(!popup.festivals[0].auto_newsletter_sent);
        assert!(popup.festivals[1].auto_newsletter_sent);

        // And the re-armed campaign goes out again on the next activation pass.
        let summary = run_activation_sweep(&store, &OkMailer, &DownText, now())
            .await
            .unwrap();
        assert_eq!(summary.dispatched, 1);
    }
}
