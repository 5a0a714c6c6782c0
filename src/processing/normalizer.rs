// Token normalisation for raw OCR output.
//
// OCR output travels as one delimiter-joined string ("|INCOME TAX DEPARTMENT|RAHUL|")
// so that fragment boundaries survive. Every function here is pure.

use crate::models::OcrToken;

pub const DELIMITER: char = '|';

/// Fragments at or below this length are noise under the strict policy.
const STRICT_MIN_FRAGMENT_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizePolicy {
    /// Drop fragments shorter than three characters.
    Strict,
    /// Keep every fragment, only uppercase.
    Aadhaar,
}

/// Join the tokens whose confidence is strictly above `threshold` into the
/// delimited raw text, e.g. `|A|B|`. No token yields `|`.
pub fn join_tokens(tokens: &[OcrToken], threshold: f32) -> String {
    let mut joined = String::from(DELIMITER);
    for token in tokens.iter().filter(|token| token.confidence > threshold) {
        joined.push_str(&token.text);
        joined.push(DELIMITER);
    }
    joined
}

/// Plain multi-line text of every token, confidence ignored.
pub fn plain_text(tokens: &[OcrToken]) -> String {
    tokens
        .iter()
        .map(|token| token.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split raw text on the delimiter. Periods are removed, fragments trimmed,
/// empty fragments dropped. Case is left untouched.
pub fn fragments(raw: &str) -> Vec<String> {
    raw.replace('.', "")
        .split(DELIMITER)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Uppercased fragments that survive the strict length filter. Multi-word
/// fragments stay whole, which keeps anchor phrases intact.
pub fn strict_fragments(raw: &str) -> Vec<String> {
    fragments(raw)
        .into_iter()
        .filter(|fragment| fragment.chars().count() >= STRICT_MIN_FRAGMENT_LEN)
        .map(|fragment| fragment.to_uppercase())
        .collect()
}

/// Flat, ordered, uppercase word sequence for the given policy.
pub fn normalize(raw: &str, policy: NormalizePolicy) -> Vec<String> {
    let selected = match policy {
        NormalizePolicy::Strict => strict_fragments(raw),
        NormalizePolicy::Aadhaar => fragments(raw)
            .into_iter()
            .map(|fragment| fragment.to_uppercase())
            .collect(),
    };
    selected
        .iter()
        .flat_map(|fragment| fragment.split_whitespace())
        .map(str::to_string)
        .collect()
}

/// Uppercase words of user-declared values. Empty values contribute nothing;
/// repeated words are kept.
pub fn declared_words(values: &[&str]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split_whitespace())
        .map(str::to_uppercase)
        .collect()
}

/// Lowercase with whitespace runs collapsed to one space.
pub fn clean_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
