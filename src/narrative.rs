//! Total extraction from the service's free-text analysis.
//!
//! When the service omits a numeric total, its narrative often still states
//! one. Two phrasings are recognized, tried in order:
//!
//! 1. [`NarrativePattern::TaggedMarker`]: `TOTAL_CO2: 1234.56`
//! 2. [`NarrativePattern::KilogramPhrase`]: `1234 kg CO2`, `kg CO₂`, `kg CO2e`
//!
//! Both are case-insensitive and allow whitespace between their parts.
//! Numbers are decimal digits with an optional fractional part; the first
//! (leftmost) occurrence of a pattern wins.

use serde::Serialize;

/// A recognized way of stating the total in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativePattern {
    TaggedMarker,
    KilogramPhrase,
}

/// A total found in a narrative, with the pattern that found it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NarrativeTotal {
    pub pattern: NarrativePattern,
    pub value: f64,
}

type ParseAttempt = fn(&str) -> Option<f64>;

/// Parse attempts in precedence order.
const ATTEMPTS: [(NarrativePattern, ParseAttempt); 2] = [
    (NarrativePattern::TaggedMarker, tagged_marker),
    (NarrativePattern::KilogramPhrase, kilogram_phrase),
];

const TAG: &str = "TOTAL_CO2:";

/// Subscript two, as in CO₂.
const SUBSCRIPT_TWO: char = '\u{2082}';

/// Return the first pattern's match.
///
/// A pattern that matches decides the outcome even when its number is 0;
/// later patterns are not consulted.
pub fn parse_total(text: &str) -> Option<NarrativeTotal> {
    ATTEMPTS.iter().find_map(|&(pattern, attempt)| {
        attempt(text).map(|value| NarrativeTotal { pattern, value })
    })
}

/// `TOTAL_CO2:` followed by optional whitespace and a number.
pub fn tagged_marker(text: &str) -> Option<f64> {
    text.char_indices().find_map(|(at, _)| {
        let after_tag = match_ignore_case(text, at, TAG)?;
        let (value, _) = scan_number(text, skip_whitespace(text, after_tag))?;
        Some(value)
    })
}

/// A number followed by `kg` and `CO2` / `CO₂`, whitespace optional between them.
pub fn kilogram_phrase(text: &str) -> Option<f64> {
    text.char_indices()
        .filter(|(_, c)| c.is_ascii_digit())
        .find_map(|(at, _)| {
            let (value, number_end) = scan_number(text, at)?;
            let after_unit = match_ignore_case(text, skip_whitespace(text, number_end), "kg")?;
            let after_co = match_ignore_case(text, skip_whitespace(text, after_unit), "co")?;
            let rest = &text[after_co..];
            (rest.starts_with('2') || rest.starts_with(SUBSCRIPT_TWO)).then_some(value)
        })
}

/// Read `digits ('.' digits)?` starting at byte `start`.
///
/// Returns the value and the byte index just past it.
fn scan_number(text: &str, start: usize) -> Option<(f64, usize)> {
    let bytes = text.as_bytes();
    let digits_from = |from: usize| {
        bytes[from..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |offset| from + offset)
    };

    if start >= bytes.len() {
        return None;
    }

    let mut end = digits_from(start);
    if end == start {
        return None;
    }

    if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
        end = digits_from(end + 1);
    }

    text[start..end].parse::<f64>().ok().map(|value| (value, end))
}

/// Byte index of the first non-whitespace character at or after `from`.
fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(offset, _)| from + offset)
}

/// If `text` has `expected` (ASCII, any case) at byte `at`, the index past it.
fn match_ignore_case(text: &str, at: usize, expected: &str) -> Option<usize> {
    let end = at.checked_add(expected.len())?;
    text.get(at..end)
        .filter(|candidate| candidate.eq_ignore_ascii_case(expected))
        .map(|_| end)
}
