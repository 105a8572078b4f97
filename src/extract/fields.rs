use std::sync::LazyLock;

use regex::Regex;

use super::SkipReason;

static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+\.\d{2}").unwrap());
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());

pub const DEFAULT_PRICE: &str = "$0.00";
pub const DEFAULT_RATING: u8 = 5;
const MIN_NAME_LEN: usize = 3;
const MIN_BODY_LEN: usize = 10;

/// First `$D.DD` amount in line order, or `$0.00`.
pub fn price(lines: &[&str]) -> String {
    lines
        .iter()
        .find_map(|l| PRICE_RE.find(l))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_PRICE.to_string())
}

/// First line, unless it is too short or UI chrome.
pub fn name(lines: &[&str], stoplist: &[String]) -> Result<String, SkipReason> {
    let first = lines.first().ok_or(SkipReason::Unreadable)?;
    if first.chars().count() < MIN_NAME_LEN {
        return Err(SkipReason::TooShort);
    }
    let lowered = first.to_lowercase();
    if stoplist.iter().any(|s| s.to_lowercase() == lowered) {
        return Err(SkipReason::Stoplisted(first.to_string()));
    }
    Ok(first.to_string())
}

/// First line carrying a `20xx` year: (line verbatim, year).
pub fn date(lines: &[&str]) -> Option<(String, i32)> {
    lines.iter().find_map(|l| {
        let year = YEAR_RE.captures(l)?.get(1)?.as_str().parse().ok()?;
        Some((l.to_string(), year))
    })
}

/// Longest line; ties go to the earliest.
pub fn longest_line(lines: &[&str]) -> Result<String, SkipReason> {
    let mut best: Option<&str> = None;
    for line in lines {
        if best.map_or(true, |b| line.chars().count() > b.chars().count()) {
            best = Some(line);
        }
    }
    match best {
        Some(b) if b.chars().count() >= MIN_BODY_LEN => Ok(b.to_string()),
        _ => Err(SkipReason::BodyTooShort),
    }
}

/// Star glyph count, clamped to 5. Missing or zero glyphs mean 5: the site
/// omits the markup for some fully rated entries.
pub fn rating(stars: Option<usize>) -> u8 {
    match stars {
        Some(n) if n > 0 => n.min(DEFAULT_RATING as usize) as u8,
        _ => DEFAULT_RATING,
    }
}

// ── Tests ──
