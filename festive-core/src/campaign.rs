//! Campaign and subscriber records for the festival promotion engine.
//!
//! Field names serialize in the camelCase shape the per-shop JSON documents
//! use, so records written by earlier deployments load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A time-boxed promotional campaign ("festival").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Stable identifier assigned at creation. Older stored records carry no
    /// id; those are matched by `(name, discountCode)` instead.
    #[serde(default)]
    pub id: Option<Uuid>,

    pub name: String,

    /// Merchant-provided offer text, e.g. "50% OFF".
    pub offer: String,

    /// Exactly 6 uppercase alphanumeric characters.
    pub discount_code: String,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,

    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub text_color: String,
    #[serde(default)]
    pub header_color: String,

    #[serde(default)]
    pub background_image_url: String,
    #[serde(default)]
    pub background_image_prompt: String,

    /// Rolling-window campaign that gets re-dated instead of expiring.
    #[serde(default)]
    pub is_infinite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period_start: Option<DateTime<Utc>>,

    /// At-most-once newsletter flag. Only ever flips false -> true, except
    /// via the infinite-campaign reset rule.
    #[serde(default)]
    pub auto_newsletter_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_letter_sent_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Campaign {
    pub fn new(
        name: impl Into<String>,
        offer: impl Into<String>,
        discount_code: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(Uuid::new_v4()),
            name: name.into(),
            offer: offer.into(),
            discount_code: discount_code.into(),
            start_date,
            end_date,
            background_color: String::new(),
            text_color: String::new(),
            header_color: String::new(),
            background_image_url: String::new(),
            background_image_prompt: String::new(),
            is_infinite: false,
            original_start_date: None,
            current_period_start: None,
            auto_newsletter_sent: false,
            news_letter_sent_at: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_colors(
        mut self,
        background: impl Into<String>,
        text: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        self.background_color = background.into();
        self.text_color = text.into();
        self.header_color = header.into();
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Mark as a rolling campaign anchored at its first start date.
    pub fn infinite(mut self) -> Self {
        self.is_infinite = true;
        self.original_start_date = Some(self.start_date);
        self.current_period_start = Some(self.start_date);
        self
    }

    /// Campaigns missing any required field are not eligible for
    /// notification and are skipped silently.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.offer.is_empty() && !self.discount_code.is_empty()
    }

    /// Identity match: stable id when both sides carry one, otherwise the
    /// `(name, discountCode)` compatibility shim.
    pub fn same_identity(&self, other: &Campaign) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name && self.discount_code == other.discount_code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Festival,
    Blog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub festivals: bool,
    pub offers: bool,
    pub blog_updates: bool,
}

impl Preferences {
    /// Defaults derived from the subscription type; callers may override.
    pub fn for_type(kind: SubscriptionType) -> Self {
        match kind {
            SubscriptionType::Festival => Self {
                festivals: true,
                offers: true,
                blog_updates: false,
            },
            SubscriptionType::Blog => Self {
                festivals: false,
                offers: false,
                blog_updates: true,
            },
        }
    }
}

/// A newsletter subscriber. Unique per `(email, shopDomain, subscriptionType)`;
/// never hard-deleted, only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub email: String,
    pub shop_domain: String,
    pub subscription_type: SubscriptionType,
    pub preferences: Preferences,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn wants_festival_mail(&self) -> bool {
        self.is_active
            && self.subscription_type == SubscriptionType::Festival
            && self.preferences.festivals
    }
}

/// How often the storefront popup re-appears for a visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayFrequency {
    Always,
    OncePerDay,
    OncePerSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    /// Milliseconds before the popup appears.
    pub show_delay: u32,
    pub display_frequency: DisplayFrequency,
    pub position: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_delay: 3000,
            display_frequency: DisplayFrequency::Always,
            position: "center".to_string(),
        }
    }
}

/// The per-shop popup document: the campaign list plus display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupSettings {
    pub is_active: bool,
    #[serde(default)]
    pub display_settings: DisplaySettings,
    #[serde(default)]
    pub festivals: Vec<Campaign>,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            is_active: true,
            display_settings: DisplaySettings::default(),
            festivals: Vec::new(),
        }
    }
}
