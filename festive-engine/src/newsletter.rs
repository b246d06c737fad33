//! Newsletter dispatch for newly-active campaigns.
//!
//! A dispatch is at-most-once per campaign: the sent flag is patched back
//! into the stored list after a successful run, and the activation sweep
//! skips flagged campaigns. Copy generation failures fall back to a local
//! template and never abort the send.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use festive_core::{Campaign, Subscriber, display_date};

use crate::collab::{MailSender, OutboundEmail, TextGenerator};
use crate::mailcfg::load_mail;
use crate::store::{SettingsStore, keys, load_or_default, load_popup, save, save_popup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub success: bool,
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub message: String,
}

impl DispatchReport {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            emails_sent: 0,
            emails_failed: 0,
            message: message.into(),
        }
    }
}

/// One line of the per-shop send history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterRecord {
    pub campaign_name: String,
    pub discount_code: String,
    pub subject: String,
    /// True only when at least one recipient accepted the mail.
    pub sent: bool,
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterCopy {
    pub title: String,
    pub content: String,
}

/// Pull the first `{..}` block out of a completion and parse it. Generators
/// like to wrap their JSON in prose.
fn extract_copy(completion: &str) -> Option<NewsletterCopy> {
    let start = completion.find('{')?;
    let end = completion.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&completion[start..=end]).ok()
}

fn fallback_copy(campaign: &Campaign) -> NewsletterCopy {
    NewsletterCopy {
        title: format!("{} is here: {}", campaign.name, campaign.offer),
        content: format!(
            "Celebrate {} with us! Enjoy {} storewide with code {} through {}.",
            campaign.name,
            campaign.offer,
            campaign.discount_code,
            display_date(campaign.end_date),
        ),
    }
}

async fn newsletter_copy(text: &dyn TextGenerator, campaign: &Campaign) -> NewsletterCopy {
    let prompt = format!(
        "Write a short promotional newsletter for the \"{}\" campaign offering {}. \
         Respond with JSON only: {{\"title\": \"...\", \"content\": \"...\"}}. \
         Keep the content to two or three sentences.",
        campaign.name, campaign.offer,
    );
    match text
        .generate("You write upbeat promotional newsletters for shops.", &prompt)
        .await
    {
        Ok(completion) => extract_copy(&completion).unwrap_or_else(|| {
            tracing::debug!(campaign = %campaign.name, "unparseable newsletter copy, using fallback");
            fallback_copy(campaign)
        }),
        Err(e) => {
            tracing::debug!(campaign = %campaign.name, error = %e, "copy generation unavailable");
            fallback_copy(campaign)
        }
    }
}

/// The full HTML body: gradient header in the campaign colors, the generated
/// copy, the offer block, and an unsubscribe footer. Text inside the colored
/// sections is forced white; merchant themes are too unpredictable to trust.
pub fn render_email_html(campaign: &Campaign, copy: &NewsletterCopy, shop: &str) -> String {
    let header = if campaign.header_color.is_empty() {
        "#4a148c"
    } else {
        &campaign.header_color
    };
    let background = if campaign.background_color.is_empty() {
        "#7b1fa2"
    } else {
        &campaign.background_color
    };
    format!(
        r#"<div style="max-width:600px;margin:0 auto;font-family:Arial,sans-serif">
  <div style="background:linear-gradient(135deg,{header},{background});color:#ffffff;padding:32px;text-align:center">
    <h1 style="margin:0">{title}</h1>
  </div>
  <div style="padding:24px;color:#333333">
    <p>{content}</p>
    <div style="background:{background};color:#ffffff;padding:16px;text-align:center;border-radius:8px">
      <p style="margin:0;font-size:18px"><strong>{offer}</strong></p>
      <p style="margin:8px 0 0">Use code <strong>{code}</strong></p>
      <p style="margin:8px 0 0">Valid {start} to {end}</p>
    </div>
  </div>
  <div style="padding:16px;text-align:center;font-size:12px;color:#999999">
    <p>You are receiving this because you subscribed to festival offers from {shop}.</p>
    <p>To unsubscribe, reply with "unsubscribe".</p>
  </div>
</div>"#,
        title = copy.title,
        content = copy.content,
        offer = campaign.offer,
        code = campaign.discount_code,
        start = display_date(campaign.start_date),
        end = display_date(campaign.end_date),
    )
}

/// Re-read the stored list and set the sent flag on the matching campaign.
/// The fresh read keeps a concurrent editor's changes to other campaigns.
pub async fn mark_notified(
    store: &dyn SettingsStore,
    shop: &str,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut popup = load_popup(store, shop).await?;
    for stored in popup.festivals.iter_mut() {
        if stored.same_identity(campaign) {
            stored.auto_newsletter_sent = true;
            stored.news_letter_sent_at = Some(now);
        }
    }
    save_popup(store, shop, &popup).await
}

/// Send the campaign newsletter to every festival subscriber of the shop.
///
/// Absent or disabled mail settings are a structured failure; zero
/// subscribers is a success with nothing sent. All recipient sends run
/// concurrently; partial failure is reported with counts.
pub async fn dispatch(
    store: &dyn SettingsStore,
    mailer: &dyn MailSender,
    text: &dyn TextGenerator,
    shop: &str,
    campaign: &Campaign,
    now: DateTime<Utc>,
) -> Result<DispatchReport> {
    let Some(settings) = load_mail(store, shop).await? else {
        tracing::warn!(shop, campaign = %campaign.name, "mail not configured, skipping dispatch");
        return Ok(DispatchReport::failure("mail not configured"));
    };

    let subscribers: Vec<Subscriber> = load_or_default(store, shop, keys::SUBSCRIBERS).await?;
    let recipients: Vec<&Subscriber> = subscribers
        .iter()
        .filter(|s| s.wants_festival_mail())
        .collect();

    if recipients.is_empty() {
        tracing::info!(shop, campaign = %campaign.name, "no festival subscribers");
        mark_notified(store, shop, campaign, now).await?;
        return Ok(DispatchReport {
            success: true,
            emails_sent: 0,
            emails_failed: 0,
            message: "no subscribers".to_string(),
        });
    }

    let copy = newsletter_copy(text, campaign).await;
    let html = render_email_html(campaign, &copy, shop);
    let sends = recipients.iter().map(|subscriber| {
        let email = OutboundEmail {
            from_name: settings.from_name.clone(),
            from_email: settings.from_email.clone(),
            to: subscriber.email.clone(),
            subject: copy.title.clone(),
            html: html.clone(),
        };
        async move {
            let result = mailer.send(&email).await;
            if let Err(e) = &result {
                tracing::warn!(to = %email.to, error = %e, "newsletter send failed");
            }
            result.is_ok()
        }
    });
    let outcomes = join_all(sends).await;

    let emails_sent = outcomes.iter().filter(|ok| **ok).count();
    let emails_failed = outcomes.len() - emails_sent;
    let success = emails_sent > 0;
    let message = if emails_failed == 0 {
        format!("sent to {emails_sent} subscribers")
    } else {
        format!("sent to {emails_sent} subscribers, {emails_failed} failed")
    };

    append_record(
        store,
        shop,
        NewsletterRecord {
            campaign_name: campaign.name.clone(),
            discount_code: campaign.discount_code.clone(),
            subject: copy.title.clone(),
            sent: success,
            emails_sent,
            emails_failed,
            sent_at: now,
        },
    )
    .await?;

    if success {
        mark_notified(store, shop, campaign, now).await?;
    }
    tracing::info!(shop, campaign = %campaign.name, emails_sent, emails_failed, "newsletter dispatched");
    Ok(DispatchReport {
        success,
        emails_sent,
        emails_failed,
        message,
    })
}

async fn append_record(
    store: &dyn SettingsStore,
    shop: &str,
    record: NewsletterRecord,
) -> Result<()> {
    let mut history: Vec<NewsletterRecord> =
        load_or_default(store, shop, keys::NEWSLETTERS).await?;
    history.push(record);
    save(store, shop, keys::NEWSLETTERS, &history).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{CollabError, CollabResult};
    use crate::mailcfg::{EmailSettings, MailProvider, save_mail};
    use crate::store::MemStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use festive_core::{Preferences, SubscriptionType};
    use std::sync::Mutex;

    struct RecordingMailer {
        sent_to: Mutex<Vec<String>>,
        fail_for: Option<&'static str>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent_to: Mutex::new(Vec::new()),
                fail_for: None,
            }
        }

        fn failing_for(address: &'static str) -> Self {
            Self {
                sent_to: Mutex::new(Vec::new()),
                fail_for: Some(address),
            }
        }
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> CollabResult<()> {
            if self.fail_for == Some(email.to.as_str()) {
                return Err(CollabError::Unavailable("bounced".into()));
            }
            self.sent_to.lock().unwrap().push(email.to.clone());
            Ok(())
        }
    }

    struct FixedText(&'static str);

    #[async_trait]
    impl TextGenerator for FixedText {
        async fn generate(&self, _system: &str, _prompt: &str) -> CollabResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct DownText;

    #[async_trait]
    impl TextGenerator for DownText {
        async fn generate(&self, _system: &str, _prompt: &str) -> CollabResult<String> {
            Err(CollabError::Unavailable("down".into()))
        }
    }

    const SHOP: &str = "demo.myshopify.com";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 2, 8, 0, 0).unwrap()
    }

    fn campaign() -> Campaign {
        let start = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap();
        Campaign::new("Dussehra", "25% OFF", "DUSS25", start, end)
            .with_colors("#7b1fa2", "#ffffff", "#4a148c")
    }

    fn subscriber(email: &str, kind: SubscriptionType, active: bool) -> Subscriber {
        Subscriber {
            email: email.to_string(),
            shop_domain: SHOP.to_string(),
            subscription_type: kind,
            preferences: Preferences::for_type(kind),
            is_active: active,
            subscribed_at: now(),
        }
    }

    async fn configure_mail(store: &MemStore) {
        let settings =
            EmailSettings::new(MailProvider::Gmail, "Demo", "hi@demo.example", "pw", "secret")
                .unwrap();
        save_mail(store, SHOP, &settings).await.unwrap();
    }

    async fn seed_subscribers(store: &MemStore, subs: &[Subscriber]) {
        save(store, SHOP, keys::SUBSCRIBERS, &subs.to_vec())
            .await
            .unwrap();
    }

    async fn seed_campaign(store: &MemStore, c: &Campaign) {
        let mut popup = festive_core::PopupSettings::default();
        popup.festivals.push(c.clone());
        save_popup(store, SHOP, &popup).await.unwrap();
    }

    #[tokio::test]
    async fn unconfigured_mail_is_a_structured_failure() {
        let store = MemStore::new();
        seed_subscribers(&store, &[subscriber("a@x.example", SubscriptionType::Festival, true)])
            .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let report = dispatch(&store, &RecordingMailer::new(), &DownText, SHOP, &c, now())
            .await
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.message, "mail not configured");

        // Flag untouched: the sweep will retry once mail is configured.
        let popup = load_popup(&store, SHOP).await.unwrap();
        assert!(!popup.festivals[0].auto_newsletter_sent);
    }

    #[tokio::test]
    async fn zero_subscribers_is_success_and_flags_the_campaign() {
        let store = MemStore::new();
        configure_mail(&store).await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let report = dispatch(&store, &RecordingMailer::new(), &DownText, SHOP, &c, now())
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.emails_sent, 0);

        let popup = load_popup(&store, SHOP).await.unwrap();
        assert!(popup.festivals[0].auto_newsletter_sent);
        assert_eq!(popup.festivals[0].news_letter_sent_at, Some(now()));
    }

    #[tokio::test]
    async fn sends_only_to_active_festival_subscribers() {
        let store = MemStore::new();
        configure_mail(&store).await;
        seed_subscribers(
            &store,
            &[
                subscriber("festival@x.example", SubscriptionType::Festival, true),
                subscriber("second@x.example", SubscriptionType::Festival, true),
                subscriber("blog@x.example", SubscriptionType::Blog, true),
                subscriber("gone@x.example", SubscriptionType::Festival, false),
            ],
        )
        .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let mailer = RecordingMailer::new();
        let report = dispatch(&store, &mailer, &DownText, SHOP, &c, now())
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.emails_sent, 2);
        assert_eq!(report.emails_failed, 0);

        let mut sent = mailer.sent_to.lock().unwrap().clone();
        sent.sort();
        assert_eq!(sent, vec!["festival@x.example", "second@x.example"]);

        let history: Vec<NewsletterRecord> =
            load_or_default(&store, SHOP, keys::NEWSLETTERS).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].sent);
        assert_eq!(history[0].discount_code, "DUSS25");
    }

    #[tokio::test]
    async fn partial_failure_reports_counts_and_still_flags() {
        let store = MemStore::new();
        configure_mail(&store).await;
        seed_subscribers(
            &store,
            &[
                subscriber("ok@x.example", SubscriptionType::Festival, true),
                subscriber("bounce@x.example", SubscriptionType::Festival, true),
            ],
        )
        .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let mailer = RecordingMailer::failing_for("bounce@x.example");
        let report = dispatch(&store, &mailer, &DownText, SHOP, &c, now())
            .await
            .unwrap();
        assert!(report.success);
        assert_eq!(report.emails_sent, 1);
        assert_eq!(report.emails_failed, 1);
        assert!(report.message.contains("1 failed"));

        let popup = load_popup(&store, SHOP).await.unwrap();
        assert!(popup.festivals[0].auto_newsletter_sent);
    }

    #[tokio::test]
    async fn total_failure_leaves_the_flag_clear() {
        let store = MemStore::new();
        configure_mail(&store).await;
        seed_subscribers(&store, &[subscriber("bounce@x.example", SubscriptionType::Festival, true)])
            .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let mailer = RecordingMailer::failing_for("bounce@x.example");
        let report = dispatch(&store, &mailer, &DownText, SHOP, &c, now())
            .await
            .unwrap();
        assert!(!report.success);
        assert_eq!(report.emails_failed, 1);

        let popup = load_popup(&store, SHOP).await.unwrap();
        assert!(!popup.festivals[0].auto_newsletter_sent);

        // The attempt still shows up in history, marked unsent.
        let history: Vec<NewsletterRecord> =
            load_or_default(&store, SHOP, keys::NEWSLETTERS).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].sent);
    }

    #[tokio::test]
    async fn generated_copy_is_extracted_from_prose() {
        let store = MemStore::new();
        configure_mail(&store).await;
        seed_subscribers(&store, &[subscriber("a@x.example", SubscriptionType::Festival, true)])
            .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        let text = FixedText(
            r#"Sure, here you go: {"title": "Dussehra Deals Are Live", "content": "Ten days of victory savings."} Enjoy!"#,
        );
        dispatch(&store, &RecordingMailer::new(), &text, SHOP, &c, now())
            .await
            .unwrap();

        let history: Vec<NewsletterRecord> =
            load_or_default(&store, SHOP, keys::NEWSLETTERS).await.unwrap();
        assert_eq!(history[0].subject, "Dussehra Deals Are Live");
    }

    #[tokio::test]
    async fn unparseable_copy_falls_back_to_the_template() {
        let store = MemStore::new();
        configure_mail(&store).await;
        seed_subscribers(&store, &[subscriber("a@x.example", SubscriptionType::Festival, true)])
            .await;
        let c = campaign();
        seed_campaign(&store, &c).await;

        dispatch(
            &store,
            &RecordingMailer::new(),
            &FixedText("no json in here at all"),
            SHOP,
            &c,
            now(),
        )
        .await
        .unwrap();

        let history: Vec<NewsletterRecord> =
            load_or_default(&store, SHOP, keys::NEWSLETTERS).await.unwrap();
        assert_eq!(history[0].subject, "Dussehra is here: 25% OFF");
    }

    #[tokio::test]
    async fn flag_patch_matches_legacy_records_without_ids() {
        let store = MemStore::new();
        let mut legacy = campaign();
        legacy.id = None;
        seed_campaign(&store, &legacy).await;

        // The in-flight copy also lacks an id; the (name, code) shim matches.
        mark_notified(&store, SHOP, &legacy, now()).await.unwrap();
        let popup = load_popup(&store, SHOP).await.unwrap();
        assert!(popup.festivals[0].auto_newsletter_sent);
    }

    #[test]
    fn html_carries_colors_code_and_footer() {
        let c = campaign();
        let copy = fallback_copy(&c);
        let html = render_email_html(&c, &copy, SHOP);
        assert!(html.contains("linear-gradient(135deg,#4a148c,#7b1fa2)"));
        assert!(html.contains("DUSS25"));
        assert!(html.contains("Valid 1 October 2026 to 5 October 2026"));
        assert!(html.contains("unsubscribe"));
        assert!(html.contains(SHOP));
    }
}
