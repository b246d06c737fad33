//! festive-core: pure primitives for the festival promotion engine.
//!
//! Everything here is synchronous and I/O free; storage and collaborator
//! calls live in `festive-engine`.

pub mod activation;
pub mod calendar;
pub mod campaign;
pub mod color;
pub mod dedupe;
pub mod discount;
pub mod time;

pub use activation::{
    RESET_AFTER_DAYS, apply_infinite_resets, date_key, find_active, find_needing_notification,
    needs_notification, reset_due,
};
pub use calendar::{Season, resolve_name, scrub_name, season_for_month};
pub use campaign::{
    Campaign, DisplayFrequency, DisplaySettings, PopupSettings, Preferences, Subscriber,
    SubscriptionType,
};
pub use color::{
    adjust_brightness, contrast_ratio, contrasting_text_color, domain_based_colors,
    has_good_contrast, hsl_to_hex, optimal_text_color, perceived_luminance,
};
pub use dedupe::{CREATION_GUARD_MINUTES, dedupe, is_near_duplicate};
pub use discount::{generate_discount_code, random_code};
pub use time::{display_date, local_today};
