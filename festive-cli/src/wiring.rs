//! Builds the live collaborator set from the environment. Anything without
//! credentials becomes an offline stand-in whose failures trigger the
//! engine's local fallbacks.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Semaphore;

use festive_engine::{
    CollabError, CollabResult, HttpMailSender, HttpPaletteExtractor, ImageGenerator, MailSender,
    NoPaletteExtractor, OpenRouterText, OutboundEmail, PaletteExtractor, PollinationsImages,
    SiteColorScraper, SiteScraper, TextGenerator,
};

const DEFAULT_TEXT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_MAIL_ENDPOINT: &str = "https://api.resend.com/emails";

pub struct Collaborators {
    pub text: Arc<dyn TextGenerator>,
    pub images: Arc<dyn ImageGenerator>,
    pub palette: Arc<dyn PaletteExtractor>,
    pub scraper: Arc<dyn SiteScraper>,
    pub mailer: Arc<dyn MailSender>,
}

struct OfflineText;

#[async_trait]
impl TextGenerator for OfflineText {
    async fn generate(&self, _system: &str, _prompt: &str) -> CollabResult<String> {
        Err(CollabError::Unavailable(
            "OPENROUTER_API_KEY is not set".to_string(),
        ))
    }
}

struct OfflineMailer;

#[async_trait]
impl MailSender for OfflineMailer {
    async fn send(&self, _email: &OutboundEmail) -> CollabResult<()> {
        Err(CollabError::Unavailable(
            "RESEND_API_KEY is not set".to_string(),
        ))
    }
}

pub fn collaborators() -> Result<Collaborators> {
    let text: Arc<dyn TextGenerator> = match std::env::var("OPENROUTER_API_KEY") {
        Ok(key) => {
            let model = std::env::var("FESTIVE_TEXT_MODEL")
                .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string());
            Arc::new(OpenRouterText::new(key, model)?)
        }
        Err(_) => {
            tracing::debug!("no OPENROUTER_API_KEY, text generation offline");
            Arc::new(OfflineText)
        }
    };

    let images: Arc<dyn ImageGenerator> =
        Arc::new(PollinationsImages::new(Arc::new(Semaphore::new(1)))?);

    let palette: Arc<dyn PaletteExtractor> = match std::env::var("FESTIVE_PALETTE_URL") {
        Ok(endpoint) => Arc::new(HttpPaletteExtractor::new(endpoint)?),
        Err(_) => Arc::new(NoPaletteExtractor),
    };

    let scraper: Arc<dyn SiteScraper> = Arc::new(SiteColorScraper::new()?);

    let mailer: Arc<dyn MailSender> = match std::env::var("RESEND_API_KEY") {
        Ok(key) => {
            let endpoint = std::env::var("FESTIVE_MAIL_URL")
                .unwrap_or_else(|_| DEFAULT_MAIL_ENDPOINT.to_string());
            Arc::new(HttpMailSender::new(endpoint, key)?)
        }
        Err(_) => {
            tracing::debug!("no RESEND_API_KEY, mail transport offline");
            Arc::new(OfflineMailer)
        }
    };

    Ok(Collaborators {
        text,
        images,
        palette,
        scraper,
        mailer,
    })
}

/// The deployment secret the sealed mail passwords are derived from.
pub fn sealing_secret() -> Result<String> {
    std::env::var("FESTIVE_SECRET").context("FESTIVE_SECRET is not set")
}
