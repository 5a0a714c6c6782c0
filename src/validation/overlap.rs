use std::collections::HashSet;

/// Share of declared words that OCR also saw, as a rounded percentage.
///
/// Repeated declared words each count in the denominator. An empty declaration
/// scores 0.
pub fn word_overlap_percent(declared: &[String], ocr_words: &[String]) -> u8 {
    if declared.is_empty() {
        return 0;
    }
    let seen: HashSet<&str> = ocr_words.iter().map(String::as_str).collect();
    let matched = declared
        .iter()
        .filter(|word| seen.contains(word.as_str()))
        .count();
    (matched as f64 * 100.0 / declared.len() as f64).round() as u8
}
