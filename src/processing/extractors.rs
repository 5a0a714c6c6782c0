// Field extraction from normalised OCR token streams.
//
// Each field is located by one named rule from `models::rules`; a rule that
// finds nothing leaves its field empty and never aborts the record.

use crate::models::rules::{DATE_FORMAT, DATE_TOKEN};
use crate::models::{DocumentRules, DocumentType, FieldRule, IdentityField, IdentityRecord};
use crate::processing::normalizer::{self, NormalizePolicy};
use chrono::NaiveDate;
use log::debug;
use regex::Regex;

/// Where a rule found its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub index: usize,
    pub value: String,
}

impl RuleHit {
    fn at(tokens: &[String], index: usize) -> Option<Self> {
        tokens.get(index).map(|value| RuleHit {
            index,
            value: value.clone(),
        })
    }
}

/// `DD/MM/YYYY` only. chrono alone would also take short or signed years.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    if !DATE_TOKEN.is_match(token) {
        return None;
    }
    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

/// Evaluate one rule against a token stream.
pub fn apply_rule(rule: &FieldRule, tokens: &[String]) -> Option<RuleHit> {
    match rule {
        FieldRule::AfterAnchor { anchor, offset } => after_anchor(tokens, anchor, *offset),
        FieldRule::AfterPhrase(phrase) => after_phrase(tokens, phrase),
        FieldRule::FirstDate => first_date(tokens).map(|(index, _)| RuleHit {
            index,
            value: tokens[index].clone(),
        }),
        FieldRule::BeforeFirstDate => before_first_date(tokens),
        FieldRule::Keyword(keywords) => first_keyword(tokens, keywords),
        FieldRule::Pattern(pattern) => first_matching(tokens, pattern),
        FieldRule::TokenRun { start, count } => token_run(tokens, start, *count),
        FieldRule::FirstOf(rules) => rules.iter().find_map(|rule| apply_rule(rule, tokens)),
    }
}

pub fn after_anchor(tokens: &[String], anchor: &str, offset: usize) -> Option<RuleHit> {
    let anchor_index = tokens.iter().position(|token| token == anchor)?;
    RuleHit::at(tokens, anchor_index + offset)
}

/// Token following `phrase`. The phrase may sit in a single token or be
/// spread over consecutive tokens as long as word boundaries line up.
pub fn after_phrase(tokens: &[String], phrase: &str) -> Option<RuleHit> {
    let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
    if phrase_words.is_empty() {
        return None;
    }

    (0..tokens.len()).find_map(|start| {
        let mut consumed = 0;
        let mut cursor = start;
        while consumed < phrase_words.len() && cursor < tokens.len() {
            let token_words: Vec<&str> = tokens[cursor].split_whitespace().collect();
            let end = consumed + token_words.len();
            if token_words.is_empty() || end > phrase_words.len() || phrase_words[consumed..end] != token_words[..] {
                return None;
            }
            consumed = end;
            cursor += 1;
        }
        if consumed == phrase_words.len() {
            RuleHit::at(tokens, cursor)
        } else {
            None
        }
    })
}

/// Earliest token that parses as a date.
pub fn first_date(tokens: &[String]) -> Option<(usize, NaiveDate)> {
    tokens
        .iter()
        .enumerate()
        .find_map(|(index, token)| parse_date(token).map(|date| (index, date)))
}

pub fn before_first_date(tokens: &[String]) -> Option<RuleHit> {
    match first_date(tokens) {
        Some((index, _)) if index > 0 => RuleHit::at(tokens, index - 1),
        _ => None,
    }
}

pub fn first_keyword(tokens: &[String], keywords: &[&str]) -> Option<RuleHit> {
    let index = tokens
        .iter()
        .position(|token| keywords.iter().any(|keyword| token.eq_ignore_ascii_case(keyword)))?;
    RuleHit::at(tokens, index)
}

pub fn first_matching(tokens: &[String], pattern: &Regex) -> Option<RuleHit> {
    let index = tokens.iter().position(|token| pattern.is_match(token))?;
    RuleHit::at(tokens, index)
}

/// `count` tokens from the first one matching `start`, space-joined. Running
/// off the end of the stream yields nothing.
pub fn token_run(tokens: &[String], start: &Regex, count: usize) -> Option<RuleHit> {
    let index = tokens.iter().position(|token| start.is_match(token))?;
    let run = tokens.get(index..index + count)?;
    Some(RuleHit {
        index,
        value: run.join(" "),
    })
}

/// Rule-table driven extractor for one document type.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    rules: DocumentRules,
}

impl DocumentExtractor {
    pub fn new(rules: DocumentRules) -> Self {
        DocumentExtractor { rules }
    }

    pub fn pan() -> Self {
        Self::new(DocumentRules::pan())
    }

    pub fn aadhaar() -> Self {
        Self::new(DocumentRules::aadhaar())
    }

    pub fn for_document(document_type: DocumentType) -> Self {
        Self::new(DocumentRules::for_document(document_type))
    }

    pub fn document_type(&self) -> DocumentType {
        self.rules.document_type
    }

    /// Token stream this extractor reads. PAN labels span several words, so the
    /// PAN side works on whole strict fragments; Aadhaar works on words.
    pub fn tokens(&self, raw_text: &str) -> Vec<String> {
        match self.rules.document_type {
            DocumentType::Pan => normalizer::strict_fragments(raw_text),
            DocumentType::Aadhaar => normalizer::normalize(raw_text, NormalizePolicy::Aadhaar),
        }
    }

    pub fn extract(&self, raw_text: &str) -> IdentityRecord {
        self.extract_from_tokens(&self.tokens(raw_text))
    }

    pub fn extract_from_tokens(&self, tokens: &[String]) -> IdentityRecord {
        let mut record = IdentityRecord::empty(self.document_type());

        for (field, rule) in &self.rules.fields {
            let Some(hit) = apply_rule(rule, tokens) else {
                debug!("{} extraction: no value for {:?}", self.document_type(), field);
                continue;
            };
            match field {
                IdentityField::Id => record.id_number = hit.value,
                IdentityField::Name => record.name = hit.value,
                IdentityField::FatherName => record.father_name = Some(hit.value),
                IdentityField::Gender => record.gender = Some(hit.value),
                IdentityField::DateOfBirth => record.date_of_birth = parse_date(&hit.value),
            }
        }

        record
    }
}

/// Pick the better-populated record. Ties go to PAN.
pub fn fuse(pan: IdentityRecord, aadhaar: IdentityRecord) -> IdentityRecord {
    if pan.populated_fields() >= aadhaar.populated_fields() {
        pan
    } else {
        aadhaar
    }
}

/// Extract identity fields from raw delimited OCR text. A known document type
/// dispatches straight to its extractor; otherwise both run and `fuse` decides.
pub fn extract_identity(raw_text: &str, document_type: Option<DocumentType>) -> IdentityRecord {
    match document_type {
        Some(document_type) => DocumentExtractor::for_document(document_type).extract(raw_text),
        None => {
            let pan = DocumentExtractor::pan().extract(raw_text);
            let aadhaar = DocumentExtractor::aadhaar().extract(raw_text);
            debug!(
                "Extraction scores: PAN={} AADHAR={}",
                pan.populated_fields(),
                aadhaar.populated_fields()
            );
            fuse(pan, aadhaar)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|word| word.to_string()).collect()
    }

    const PAN_TEXT: &str = "|INCOME TAX DEPARTMENT|GOVT. OF INDIA|Permanent Account Number Card|ABCDE1234F|Name|RAHUL KUMAR|Father's Name|SURESH KUMAR|Date of Birth|15/08/1990|";
    const AADHAAR_TEXT: &str = "|Government of India|RAHUL|15/08/1990|Male|1234|5678|9012|";

    #[test]
    fn test_pan_extraction() {
        let record = DocumentExtractor::pan().extract(PAN_TEXT);
        assert_eq!(record.id_type, DocumentType::Pan);
        assert_eq!(record.name, "RAHUL KUMAR");
        assert_eq!(record.father_name.as_deref(), Some("SURESH KUMAR"));
        assert_eq!(record.id_number, "ABCDE1234F");
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1990, 8, 15));
    }

    #[test]
    fn test_pan_missing_anchor_keeps_other_fields() {
        let record = DocumentExtractor::pan().extract("|NAME|RAHUL KUMAR|01/01/2000|");
        assert_eq!(record.name, "RAHUL KUMAR");
        assert_eq!(record.father_name.as_deref(), Some(""));
        assert_eq!(record.id_number, "");
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(2000, 1, 1));
    }

    #[test]
    fn test_aadhaar_name_before_dob() {
        let stream = tokens(&["GOVERNMENT", "RAHUL", "15/08/1990", "MALE"]);
        let record = DocumentExtractor::aadhaar().extract_from_tokens(&stream);
        assert_eq!(record.name, "RAHUL");
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1990, 8, 15));
        assert_eq!(record.gender.as_deref(), Some("MALE"));
    }

    #[test]
    fn test_aadhaar_dob_first_token_has_no_name() {
        let stream = tokens(&["15/08/1990", "RAHUL"]);
        let record = DocumentExtractor::aadhaar().extract_from_tokens(&stream);
        assert_eq!(record.name, "");
        assert!(record.date_of_birth.is_some());
    }

    #[test]
    fn test_aadhaar_id_from_digit_groups() {
        let record = DocumentExtractor::aadhaar().extract(AADHAAR_TEXT);
        assert_eq!(record.id_number, "1234 5678 9012");
        assert_eq!(record.gender.as_deref(), Some("MALE"));
    }

    #[test]
    fn test_aadhaar_grouped_token_preferred() {
        let stream = tokens(&["4321", "1234 5678 9012"]);
        let record = DocumentExtractor::aadhaar().extract_from_tokens(&stream);
        assert_eq!(record.id_number, "1234 5678 9012");
    }

    #[test]
    fn test_aadhaar_digit_run_out_of_range() {
        let stream = tokens(&["RAHUL", "1234", "5678"]);
        let record = DocumentExtractor::aadhaar().extract_from_tokens(&stream);
        assert_eq!(record.id_number, "");
    }

    #[test]
    fn test_after_phrase_split_across_tokens() {
        let stream = tokens(&["PERMANENT ACCOUNT", "NUMBER", "CARD", "ABCDE1234F"]);
        let hit = after_phrase(&stream, "PERMANENT ACCOUNT NUMBER CARD").unwrap();
        assert_eq!(hit.value, "ABCDE1234F");
        assert_eq!(hit.index, 3);
        assert!(after_phrase(&tokens(&["PERMANENT ACCOUNT NUMBER CARD"]), "PERMANENT ACCOUNT NUMBER CARD").is_none());
    }

    #[test]
    fn test_earliest_date_wins() {
        let stream = tokens(&["01/01/2001", "15/08/1990"]);
        assert_eq!(first_date(&stream).map(|(index, _)| index), Some(0));
        assert!(first_date(&tokens(&["31/02/1990", "1990-08-15"])).is_none());
    }

    #[test]
    fn test_short_and_signed_years_are_not_dates() {
        for token in ["12/10/20", "1/2/3", "01/01/+1990", "01/01/-199", "15/08/19900"] {
            assert_eq!(parse_date(token), None, "{}", token);
        }
        assert_eq!(parse_date("1/2/1990"), NaiveDate::from_ymd_opt(1990, 2, 1));

        let stream = tokens(&["GOVT", "12/10/20", "RAHUL", "15/08/1990", "MALE"]);
        let record = DocumentExtractor::aadhaar().extract_from_tokens(&stream);
        assert_eq!(record.name, "RAHUL");
        assert_eq!(record.date_of_birth, NaiveDate::from_ymd_opt(1990, 8, 15));
    }

    #[test]
    fn test_fusion_tie_goes_to_pan() {
        let mut pan = IdentityRecord::empty(DocumentType::Pan);
        pan.name = "RAHUL".to_string();
        let mut aadhaar = IdentityRecord::empty(DocumentType::Aadhaar);
        aadhaar.gender = Some("MALE".to_string());
        assert_eq!(fuse(pan, aadhaar).id_type, DocumentType::Pan);
    }

    #[test]
    fn test_fusion_prefers_more_fields() {
        let record = extract_identity(AADHAAR_TEXT, None);
        assert_eq!(record.id_type, DocumentType::Aadhaar);
        let record = extract_identity(PAN_TEXT, None);
        assert_eq!(record.id_type, DocumentType::Pan);
    }

    #[test]
    fn test_explicit_dispatch() {
        let record = extract_identity(PAN_TEXT, Some(DocumentType::Aadhaar));
        assert_eq!(record.id_type, DocumentType::Aadhaar);
    }
}
