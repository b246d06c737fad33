//! Discount code derivation: a 6-character uppercase alphanumeric code built
//! from the campaign name and the offer text.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::calendar::season_for_month;

const CODE_LEN: usize = 6;
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)%").unwrap())
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d+)").unwrap())
}

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)").unwrap())
}

/// Numeric tail of the code: percentage first, then dollar amount, then any
/// embedded digits, then "25". At most two digits.
fn number_part(offer: &str) -> String {
    let captured = percent_re()
        .captures(offer)
        .or_else(|| amount_re().captures(offer))
        .or_else(|| digits_re().captures(offer))
        .and_then(|c| c.get(1).map(|m| m.as_str().to_string()));
    let digits = captured.unwrap_or_else(|| "25".to_string());
    digits.chars().take(2).collect()
}

/// Alphabetic words of length > 2 from the name, uppercased.
fn name_words(name: &str) -> Vec<String> {
    name.chars()
        .map(|c| if c.is_ascii_alphabetic() || c == ' ' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .map(|w| w.to_uppercase())
        .collect()
}

/// Fully random fallback code, for callers with nothing to derive from.
pub fn random_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Derive the 6-character discount code. `month` feeds the season fallback
/// used when the name contributes no usable words. Deterministic except for
/// the random padding of short results.
pub fn generate_discount_code<R: Rng>(name: &str, offer: &str, month: u32, rng: &mut R) -> String {
    let number = number_part(offer);
    let budget = CODE_LEN - number.len();

    let words = name_words(name);
    let text: String = match words.len() {
        0 => season_for_month(month)
            .label()
            .to_uppercase()
            .chars()
            .take(budget)
            .collect(),
        1 => words[0].chars().take(budget).collect(),
        _ => {
            // Split the budget roughly in half across the first two words.
            let first: String = words[0].chars().take(budget.div_ceil(2)).collect();
            let second: String = words[1].chars().take(budget - first.len()).collect();
            first + &second
        }
    };

    let mut code: String = (text + &number)
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();

    code.truncate(CODE_LEN);
    while code.len() < CODE_LEN {
        code.push(CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char);
    }
    code
}
