//! festive-engine: async orchestration around the festive-core primitives.
//!
//! Collaborator traits and HTTP implementations, the per-shop settings
//! store, campaign synthesis, newsletter dispatch, subscriptions, mail
//! configuration, and the periodic sweeps.

pub mod collab;
pub mod mailcfg;
pub mod newsletter;
pub mod seal;
pub mod store;
pub mod subscribers;
pub mod sweep;
pub mod synth;

pub use collab::{
    CollabError, CollabResult, HttpMailSender, HttpPaletteExtractor, ImageGenerator, MailSender,
    NoPaletteExtractor, OpenRouterText, OutboundEmail, Palette, PaletteExtractor,
    PollinationsImages, SiteColorScraper, SiteColors, SiteScraper, TextGenerator,
};
pub use mailcfg::{EmailSettings, MailProvider, SmtpConfig};
pub use newsletter::{DispatchReport, NewsletterRecord, dispatch};
pub use store::{FileStore, MemStore, SettingsStore};
pub use subscribers::{SubscribeOutcome, subscribe, unsubscribe};
pub use sweep::{run_activation_sweep, run_reset_sweep, run_shop_activation, spawn_schedulers};
pub use synth::{CampaignRequest, CreateOutcome, Synthesizer, cleanup_campaigns, create_campaign};
