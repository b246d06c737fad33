//! Color math for popup and newsletter theming: domain-derived palettes,
//! perceived-luminance contrast, and WCAG ratio checks.

use anyhow::{Result, bail};

/// Parse `#RRGGBB` (leading `#` optional) into channel bytes.
pub fn parse_hex(color: &str) -> Result<(u8, u8, u8)> {
    let hex = color.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("invalid hex color: {color}");
    }
    let r = u8::from_str_radix(&hex[0..2], 16)?;
    let g = u8::from_str_radix(&hex[2..4], 16)?;
    let b = u8::from_str_radix(&hex[4..6], 16)?;
    Ok((r, g, b))
}

/// HSL (h in degrees, s and l in percent) to `#rrggbb`.
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    let l = l / 100.0;
    let a = s * l.min(1.0 - l) / 100.0;
    let f = |n: f64| -> u8 {
        let k = (n + h / 30.0) % 12.0;
        let color = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * color).round() as u8
    };
    format!("#{:02x}{:02x}{:02x}", f(0.0), f(8.0), f(4.0))
}

/// Primary/header pair derived from a shop domain when the storefront can't
/// be scraped. A JS-style 32-bit string hash picks the hue; saturation and
/// lightness are fixed.
pub fn domain_based_colors(domain: &str) -> (String, String) {
    let mut hash: i32 = 0;
    for b in domain.chars() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(b as i32);
    }
    let hue = f64::from(hash.unsigned_abs() % 360);
    let primary = hsl_to_hex(hue, 70.0, 50.0);
    let header = hsl_to_hex(hue, 70.0, 35.0);
    (primary, header)
}

/// Lighten (positive percent) or darken (negative) each channel.
pub fn adjust_brightness(color: &str, percent: i32) -> String {
    let Ok((r, g, b)) = parse_hex(color) else {
        return color.to_string();
    };
    let amt = (2.55 * f64::from(percent)).round() as i32;
    let clamp = |c: u8| (i32::from(c) + amt).clamp(0, 255) as u8;
    format!("#{:02x}{:02x}{:02x}", clamp(r), clamp(g), clamp(b))
}

/// Perceived luminance in [0, 1] via the weighted RGB formula.
pub fn perceived_luminance(color: &str) -> Result<f64> {
    let (r, g, b) = parse_hex(color)?;
    Ok((0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0)
}

/// Pure white on dark backgrounds, pure black on light ones. The 0.6
/// threshold is stricter than the midpoint on purpose: mid-tones read better
/// with white text.
pub fn contrasting_text_color(background: &str) -> &'static str {
    match perceived_luminance(background) {
        Ok(l) if l < 0.6 => "#ffffff",
        Ok(_) => "#000000",
        Err(_) => "#ffffff",
    }
}

fn relative_luminance(color: &str) -> Result<f64> {
    let (r, g, b) = parse_hex(color)?;
    let lin = |c: u8| {
        let c = f64::from(c) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    Ok(0.2126 * lin(r) + 0.7152 * lin(g) + 0.0722 * lin(b))
}

/// WCAG contrast ratio between two colors, in [1, 21].
pub fn contrast_ratio(a: &str, b: &str) -> Result<f64> {
    let la = relative_luminance(a)?;
    let lb = relative_luminance(b)?;
    Ok((la.max(lb) + 0.05) / (la.min(lb) + 0.05))
}

/// WCAG AA for normal text.
pub fn has_good_contrast(text: &str, background: &str) -> bool {
    contrast_ratio(text, background).map(|r| r >= 4.5).unwrap_or(false)
}

/// Pick white or black text for a dominant color, refined against a palette
/// when one is available: both candidates are scored by their average ratio
/// over palette entries that pass AA, and the better average wins.
pub fn optimal_text_color(primary: &str, palette: &[String]) -> String {
    let base = contrasting_text_color(primary).to_string();
    if palette.is_empty() {
        return base;
    }

    let mut best = base;
    let mut best_score = 0.0;
    for candidate in ["#ffffff", "#000000"] {
        let mut total = 0.0;
        let mut passing = 0u32;
        for entry in palette {
            if has_good_contrast(candidate, entry) {
                if let Ok(ratio) = contrast_ratio(candidate, entry) {
                    total += ratio;
                    passing += 1;
                }
            }
        }
        let score = if passing > 0 { total / f64::from(passing) } else { 0.0 };
        if score > best_score {
            best_score = score;
            best = candidate.to_string();
        }
    }
    best
}
