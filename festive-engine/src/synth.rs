//! Campaign synthesis: turn a shop domain, an offer, and a date window into
//! a fully-styled campaign record.
//!
//! Every collaborator step degrades to a local fallback; synthesis itself
//! never fails because a remote service is down.

use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;

use festive_core::{
    Campaign, contrasting_text_color, dedupe, domain_based_colors, generate_discount_code,
    is_near_duplicate, optimal_text_color, resolve_name, scrub_name,
};

use crate::collab::{ImageGenerator, PaletteExtractor, SiteScraper, TextGenerator};
use crate::store::{SettingsStore, load_popup, save_popup};

/// Names kept as resolved: well-known festivals the refinement step would
/// only water down. Matched case-insensitively as substrings.
const SPECIFIC_FESTIVALS: &[&str] = &[
    "Rath Yatra",
    "Father's",
    "Mother's",
    "Diwali",
    "Holi",
    "Dussehra",
    "Christmas",
    "Eid",
    "Raksha Bandhan",
    "Independence",
    "Republic",
];

/// Days an infinite campaign's first window runs before the rolling reset
/// takes over.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct CampaignRequest {
    pub shop_domain: String,
    pub offer: String,
    pub start: DateTime<Utc>,
    /// Absent end date makes the campaign infinite.
    pub end: Option<DateTime<Utc>>,
    pub infinite: bool,
    /// Caller-supplied text color, honored when no image palette exists.
    pub text_color: Option<String>,
}

impl CampaignRequest {
    fn effective_window(&self) -> (DateTime<Utc>, DateTime<Utc>, bool) {
        let infinite = self.infinite || self.end.is_none();
        let end = self
            .end
            .unwrap_or(self.start + Duration::days(DEFAULT_WINDOW_DAYS));
        (self.start, end, infinite)
    }
}

pub struct Synthesizer<'a> {
    pub text: &'a dyn TextGenerator,
    pub images: &'a dyn ImageGenerator,
    pub palette: &'a dyn PaletteExtractor,
    pub scraper: &'a dyn SiteScraper,
}

impl Synthesizer<'_> {
    /// Resolve the campaign name for the start date, refining generic names
    /// through the text generator when one is reachable.
    async fn campaign_name<R: Rng + Send>(&self, req: &CampaignRequest, rng: &mut R) -> String {
        let resolved = resolve_name(req.start.date_naive(), rng);

        let specific = SPECIFIC_FESTIVALS
            .iter()
            .any(|f| resolved.to_lowercase().contains(&f.to_lowercase()));
        if specific {
            return scrub_name(&resolved);
        }

        let refined = self
            .text
            .generate(
                "You write short, catchy names for shop promotion campaigns.",
                &format!(
                    "Suggest one catchy campaign name for a promotion around \"{resolved}\". \
                     Reply with the name only, no quotes."
                ),
            )
            .await;
        let name = match refined {
            Ok(name) if name.len() > 3 && name.len() < 50 => name,
            Ok(_) | Err(_) => resolved,
        };
        scrub_name(&name)
    }

    /// Build the full campaign. Always succeeds; collaborator failures leave
    /// fallback styling behind instead of propagating.
    pub async fn synthesize<R: Rng + Send>(
        &self,
        req: &CampaignRequest,
        rng: &mut R,
    ) -> Campaign {
        let (start, end, infinite) = req.effective_window();

        let name = self.campaign_name(req, rng).await;
        let code = generate_discount_code(&name, &req.offer, start.date_naive().month(), rng);

        let (site_primary, site_header) = match self.scraper.site_colors(&req.shop_domain).await {
            Ok(colors) => (colors.primary, colors.header),
            Err(e) => {
                tracing::debug!(shop = %req.shop_domain, error = %e, "storefront colors unavailable");
                domain_based_colors(&req.shop_domain)
            }
        };

        let image_prompt = format!("{} celebration background with decorative elements",
            name.to_lowercase());
        let (image_url, palette) = match self.images.generate(&image_prompt).await {
            Ok(url) => {
                let palette = match self.palette.extract(&url).await {
                    Ok(p) => Some(p),
                    Err(e) => {
                        tracing::debug!(error = %e, "palette extraction unavailable");
                        None
                    }
                };
                (url, palette)
            }
            Err(e) => {
                tracing::debug!(error = %e, "image generation unavailable");
                (String::new(), None)
            }
        };

        let (background, text_color, header) = match &palette {
            Some(p) => {
                let background = if p.background.is_empty() {
                    p.primary.clone()
                } else {
                    p.background.clone()
                };
                let text = optimal_text_color(&background, &p.colors);
                (background, text, p.primary.clone())
            }
            None => {
                let text = req
                    .text_color
                    .clone()
                    .unwrap_or_else(|| contrasting_text_color(&site_primary).to_string());
                (site_primary, text, site_header)
            }
        };

        let mut campaign = Campaign::new(name, req.offer.clone(), code, start, end)
            .with_colors(background, text_color, header);
        campaign.background_image_url = image_url;
        campaign.background_image_prompt = image_prompt;
        if infinite {
            campaign = campaign.infinite();
        }
        campaign
    }
}

/// Outcome of a guarded create. A near-duplicate is a normal result, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(Campaign),
    NearDuplicate,
}

/// Synthesize and persist a campaign unless the write-time duplicate guard
/// blocks it.
pub async fn create_campaign<R: Rng + Send>(
    store: &dyn SettingsStore,
    synth: &Synthesizer<'_>,
    req: &CampaignRequest,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<CreateOutcome> {
    let (start, end, _) = req.effective_window();

    let mut popup = load_popup(store, &req.shop_domain).await?;
    if is_near_duplicate(&popup.festivals, &req.offer, start, end, now) {
        tracing::info!(shop = %req.shop_domain, offer = %req.offer, "near-duplicate campaign blocked");
        return Ok(CreateOutcome::NearDuplicate);
    }

    let campaign = synth.synthesize(req, rng).await;
    tracing::info!(shop = %req.shop_domain, name = %campaign.name, code = %campaign.discount_code,
        "campaign created");
    popup.festivals.push(campaign.clone());
    save_popup(store, &req.shop_domain, &popup).await?;
    Ok(CreateOutcome::Created(campaign))
}

/// Drop stored duplicate campaigns, first occurrence wins. Returns how many
/// were removed.
pub async fn cleanup_campaigns(store: &dyn SettingsStore, shop: &str) -> Result<usize> {
    let mut popup = load_popup(store, shop).await?;
    let before = popup.festivals.len();
    popup.festivals = dedupe(std::mem::take(&mut popup.festivals));
    let removed = before - popup.festivals.len();
    if removed > 0 {
        tracing::info!(shop, removed, "duplicate campaigns removed");
        save_popup(store, shop, &popup).await?;
    }
    Ok(removed)
}
