//! External collaborators behind trait seams: text generation, image
//! generation, palette extraction, storefront scraping, and mail delivery.
//!
//! Every implementation carries a bounded timeout, and every failure maps to
//! [`CollabError`] so callers can fall back locally instead of propagating.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use festive_core::adjust_brightness;

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("malformed collaborator response: {0}")]
    Malformed(String),
}

pub type CollabResult<T> = std::result::Result<T, CollabError>;

impl From<reqwest::Error> for CollabError {
    fn from(e: reqwest::Error) -> Self {
        CollabError::Unavailable(e.to_string())
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> CollabResult<String>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// A reachable image URL for the prompt. Implementations degrade to a
    /// simpler prompt rather than failing outright where they can.
    async fn generate(&self, prompt: &str) -> CollabResult<String>;
}

/// Dominant colors pulled out of a generated background image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub background: String,
    pub colors: Vec<String>,
}

#[async_trait]
pub trait PaletteExtractor: Send + Sync {
    async fn extract(&self, image_url: &str) -> CollabResult<Palette>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteColors {
    pub primary: String,
    pub header: String,
}

#[async_trait]
pub trait SiteScraper: Send + Sync {
    async fn site_colors(&self, shop_domain: &str) -> CollabResult<SiteColors>;
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from_name: String,
    pub from_email: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> CollabResult<()>;
}

/// Chat-completions text generation via OpenRouter.
pub struct OpenRouterText {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenRouterText {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenRouterText {
    async fn generate(&self, system: &str, prompt: &str) -> CollabResult<String> {
        #[derive(Serialize)]
        struct Msg {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct Req {
            model: String,
            messages: Vec<Msg>,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: self.model.clone(),
            messages: vec![
                Msg {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Msg {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.7,
        };

        let resp = self
            .client
            .post("https://openrouter.ai/api/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(CollabError::Unavailable(format!("openrouter: {status} {txt}")));
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| CollabError::Malformed(e.to_string()))?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(CollabError::Malformed("empty completion".to_string()));
        }
        Ok(content.trim().to_string())
    }
}

/// Prompt-to-URL image generation against the Pollinations service.
///
/// Generation is admitted one at a time through a shared semaphore: a busy
/// generator does not queue, it immediately hands back the simplified-prompt
/// URL unprobed.
pub struct PollinationsImages {
    client: reqwest::Client,
    limit: Arc<Semaphore>,
}

const IMAGE_BASE: &str = "https://image.pollinations.ai/prompt/";
const IMAGE_QUERY: &str = "width=1200&height=600&nologo=true";
const GENERIC_PROMPT: &str = "festive celebration background";

fn image_url(prompt: &str) -> CollabResult<String> {
    let mut url = Url::parse(IMAGE_BASE)
        .map_err(|e| CollabError::Malformed(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| CollabError::Malformed("image base url".to_string()))?
        .pop_if_empty()
        .push(prompt);
    url.set_query(Some(IMAGE_QUERY));
    Ok(url.to_string())
}

/// Styling keywords appended to every generation prompt.
pub fn enhance_prompt(prompt: &str) -> String {
    format!("{prompt}, vibrant colors, festive atmosphere, high quality, detailed")
}

/// Fallback prompt: the first three words, without the styling keywords.
fn simplify_prompt(prompt: &str) -> String {
    prompt.split_whitespace().take(3).collect::<Vec<_>>().join(" ")
}

impl PollinationsImages {
    pub fn new(limit: Arc<Semaphore>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self { client, limit })
    }

    async fn probe(&self, url: &str, timeout: Duration) -> bool {
        match self.client.head(url).timeout(timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ImageGenerator for PollinationsImages {
    async fn generate(&self, prompt: &str) -> CollabResult<String> {
        let simplified = image_url(&simplify_prompt(prompt))?;

        let Ok(_permit) = self.limit.try_acquire() else {
            tracing::debug!("image generator busy, using simplified url");
            return Ok(simplified);
        };

        let enhanced = image_url(&enhance_prompt(prompt))?;
        if self.probe(&enhanced, Duration::from_secs(30)).await {
            return Ok(enhanced);
        }
        tracing::debug!("enhanced prompt unreachable, probing simplified");
        if self.probe(&simplified, Duration::from_secs(5)).await {
            return Ok(simplified);
        }
        image_url(GENERIC_PROMPT)
    }
}

/// Palette extraction via the image service's companion endpoint.
pub struct HttpPaletteExtractor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPaletteExtractor {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PaletteExtractor for HttpPaletteExtractor {
    async fn extract(&self, image_url: &str) -> CollabResult<Palette> {
        #[derive(Serialize)]
        struct Req<'a> {
            #[serde(rename = "imageUrl")]
            image_url: &'a str,
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&Req { image_url })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollabError::Unavailable(format!("palette: {status}")));
        }
        let palette: Palette = resp
            .json()
            .await
            .map_err(|e| CollabError::Malformed(e.to_string()))?;
        if palette.colors.is_empty() {
            return Err(CollabError::Malformed("empty palette".to_string()));
        }
        Ok(palette)
    }
}

/// No companion endpoint configured; every extraction is unavailable.
pub struct NoPaletteExtractor;

#[async_trait]
impl PaletteExtractor for NoPaletteExtractor {
    async fn extract(&self, _image_url: &str) -> CollabResult<Palette> {
        Err(CollabError::Unavailable(
            "no palette endpoint configured".to_string(),
        ))
    }
}

/// Pulls brand colors off the storefront by regexing inline hex colors out
/// of the landing page.
pub struct SiteColorScraper {
    client: reqwest::Client,
}

impl SiteColorScraper {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

fn first_hex_color(html: &str) -> Option<String> {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"#[0-9a-fA-F]{6}\b").unwrap());
    re.find(html).map(|m| m.as_str().to_lowercase())
}

#[async_trait]
impl SiteScraper for SiteColorScraper {
    async fn site_colors(&self, shop_domain: &str) -> CollabResult<SiteColors> {
        let resp = self
            .client
            .get(format!("https://{shop_domain}"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollabError::Unavailable(format!("storefront: {status}")));
        }
        let html = resp.text().await?;
        let primary = first_hex_color(&html)
            .ok_or_else(|| CollabError::Malformed("no inline colors found".to_string()))?;
        let header = adjust_brightness(&primary, -20);
        Ok(SiteColors { primary, header })
    }
}

/// JSON mail delivery in the Resend wire shape.
pub struct HttpMailSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpMailSender {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send(&self, email: &OutboundEmail) -> CollabResult<()> {
        #[derive(Serialize)]
        struct Req<'a> {
            from: String,
            to: Vec<&'a str>,
            subject: &'a str,
            html: &'a str,
        }

        let body = Req {
            from: format!("{} <{}>", email.from_name, email.from_email),
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(CollabError::Unavailable(format!("mail: {status} {txt}")));
        }
        Ok(())
    }
}
