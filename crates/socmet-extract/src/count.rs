//! Normalization of human-readable engagement counts (`"2.3K"`, `"1,234"`,
//! `"1.2 แสน"`) into integers.
//!
//! Arithmetic is done on the decimal digits directly rather than through
//! `f64`, so `"2.3K"` is exactly 2300 and results never depend on float
//! rounding.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// ASCII digits only: `\d` would also accept Thai and other numeral scripts.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<whole>[0-9]+)(?:\.(?P<frac>[0-9]+))?").expect("valid number regex")
});

/// Latin suffixes, checked first.
const LATIN_SUFFIXES: [(char, u128); 3] = [('k', 1_000), ('m', 1_000_000), ('b', 1_000_000_000)];

/// Thai magnitude keywords, checked after the Latin suffixes.
const THAI_KEYWORDS: [(&str, u128); 4] = [
    ("พัน", 1_000),
    ("หมื่น", 10_000),
    ("แสน", 100_000),
    ("ล้าน", 1_000_000),
];

/// Fractional digits beyond this precision cannot change the floored result
/// for any supported multiplier.
const MAX_FRACTION_DIGITS: usize = 18;

/// Converts abbreviated or localized count text into an integer.
///
/// Thousands separators and surrounding whitespace are ignored. The first
/// numeric literal is multiplied by an optional magnitude marker directly
/// following it and floored. Returns `0` for empty, non-numeric or otherwise
/// unparseable input.
#[must_use]
pub fn parse_count(raw: &str) -> u64 {
    let cleaned = strip_separators(raw.trim());
    let Some(caps) = NUMBER_RE.captures(&cleaned) else {
        return 0;
    };
    let Some(literal) = caps.get(0) else {
        return 0;
    };

    let whole = caps.name("whole").map_or("", |m| m.as_str());
    let frac = caps.name("frac").map_or("", |m| m.as_str());
    let multiplier = magnitude(&cleaned[literal.end()..]);

    scale(whole, frac, multiplier)
}

/// Maps a model-reported JSON field to a count.
///
/// Numbers and numeric-looking strings (including suffixed ones such as
/// `"2.2K"`) are normalized; `null`, negative values (numeric or a string
/// with a leading `-`) and strings without any digit are treated as "not
/// reported".
#[must_use]
pub fn parse_count_token(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| parse_count(&f.to_string()))
        }),
        Value::String(s) if s.trim_start().starts_with('-') => None,
        Value::String(s) if s.chars().any(|c| c.is_ascii_digit()) => Some(parse_count(s)),
        _ => None,
    }
}

/// Drops `,` and any whitespace sitting between two digits ("1 234").
fn strip_separators(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().filter(|c| *c != ',').collect();
    let mut out = String::with_capacity(raw.len());
    for (i, c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let prev_digit = out.chars().last().is_some_and(|p| p.is_ascii_digit());
            let next_digit = chars[i..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(char::is_ascii_digit);
            if prev_digit && next_digit {
                continue;
            }
        }
        out.push(*c);
    }
    out
}

fn magnitude(rest: &str) -> u128 {
    let rest = rest.trim_start();
    let mut chars = rest.chars();

    if let Some(first) = chars.next() {
        let lower = first.to_ascii_lowercase();
        if let Some((_, multiplier)) = LATIN_SUFFIXES.iter().find(|(c, _)| *c == lower) {
            // "5 bananas" is not five billion.
            if !chars.next().is_some_and(char::is_alphabetic) {
                return *multiplier;
            }
        }
    }

    THAI_KEYWORDS
        .iter()
        .find(|(keyword, _)| rest.starts_with(keyword))
        .map_or(1, |(_, multiplier)| *multiplier)
}

fn scale(whole: &str, frac: &str, multiplier: u128) -> u64 {
    let whole_value = whole.parse::<u128>().unwrap_or(u128::MAX);
    let mut total = whole_value.saturating_mul(multiplier);

    let frac = &frac[..frac.len().min(MAX_FRACTION_DIGITS)];
    if !frac.is_empty() {
        let frac_value = frac.parse::<u128>().unwrap_or(0);
        let denominator = 10u128.pow(u32::try_from(frac.len()).unwrap_or(0));
        total = total.saturating_add(frac_value.saturating_mul(multiplier) / denominator);
    }

    u64::try_from(total).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "count_test.rs"]
mod tests;
