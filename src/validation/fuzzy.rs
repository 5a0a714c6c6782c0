// Token-set fuzzy matching of declared values against OCR text.

use std::collections::BTreeSet;
use std::fmt;

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 85;

/// Lowercase, non-word characters turned into spaces, trimmed.
fn full_process(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Indel similarity of two strings, 0-100. Identical strings (even empty ones)
/// score 100; one empty side scores 0.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a == b {
        return 100;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let lcs = longest_common_subsequence(&a, &b);
    (200.0 * lcs as f64 / (a.len() + b.len()) as f64).round() as u8
}

/// Order-insensitive similarity: the shared words are compared against each
/// side's full word set, so a value fully contained in the text scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a = full_process(a);
    let b = full_process(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |words: Vec<&str>| words.join(" ");
    let intersection = join(tokens_a.intersection(&tokens_b).copied().collect());
    let only_a = join(tokens_a.difference(&tokens_b).copied().collect());
    let only_b = join(tokens_b.difference(&tokens_a).copied().collect());

    let combined_a = format!("{} {}", intersection, only_a).trim().to_string();
    let combined_b = format!("{} {}", intersection, only_b).trim().to_string();

    [
        ratio(&intersection, &combined_a),
        ratio(&intersection, &combined_b),
        ratio(&combined_a, &combined_b),
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
}

/// Outcome of fuzzy-matching one declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub label: String,
    pub score: u8,
    pub verified: bool,
}

impl fmt::Display for FieldCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let result = if self.verified { "✅ Verified" } else { "❌ Not Verified" };
        write!(f, "{}: {} (Score: {})", self.label, result, self.score)
    }
}

/// Fuzzy-match `value` against already cleaned OCR `text`.
pub fn verify_field(label: &str, value: &str, text: &str, threshold: u8) -> FieldCheck {
    let score = token_set_ratio(&value.to_lowercase(), text);
    FieldCheck {
        label: label.to_string(),
        score,
        verified: score >= threshold,
    }
}
