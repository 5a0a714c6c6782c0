use crate::models::DocumentType;
use lazy_static::lazy_static;
use regex::Regex;

/// Date layout printed on both card types.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub const PAN_NAME_ANCHOR: &str = "NAME";
pub const PAN_ID_ANCHOR: &str = "PERMANENT ACCOUNT NUMBER CARD";
pub const GENDER_KEYWORDS: &[&str] = &["male", "female"];

lazy_static! {
    /// Ten character PAN: five letters, four digits, one letter.
    pub static ref PAN_NUMBER: Regex = Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").unwrap();
    /// Aadhaar number anywhere in free text, grouped or not.
    pub static ref AADHAAR_NUMBER_IN_TEXT: Regex = Regex::new(r"\b\d{4}\s?\d{4}\s?\d{4}\b").unwrap();
    /// Aadhaar number kept as one OCR token with its group spacing.
    pub static ref AADHAAR_GROUPED_TOKEN: Regex = Regex::new(r"^\d{4} \d{4} \d{4}$").unwrap();
    pub static ref FOUR_DIGIT_TOKEN: Regex = Regex::new(r"^\d{4}$").unwrap();
    /// Shape of a `DATE_FORMAT` token; the year must have all four digits.
    pub static ref DATE_TOKEN: Regex = Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Id,
    Name,
    FatherName,
    Gender,
    DateOfBirth,
}

/// A positional heuristic that locates one field in a token stream.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Token `offset` positions after the first token equal to `anchor`.
    AfterAnchor { anchor: &'static str, offset: usize },
    /// Token right after `phrase`, whether OCR kept the phrase as one token or split it.
    AfterPhrase(&'static str),
    /// First token that parses as a `DATE_FORMAT` date.
    FirstDate,
    /// Token immediately before the first date token.
    BeforeFirstDate,
    /// First token equal to one of the keywords, ignoring case.
    Keyword(&'static [&'static str]),
    /// First token matching the whole pattern.
    Pattern(&'static Regex),
    /// `count` tokens starting at the first token matching `start`, joined by spaces.
    TokenRun { start: &'static Regex, count: usize },
    /// First rule that produces a value.
    FirstOf(Vec<FieldRule>),
}

/// Extraction rule table for one document type, applied in order.
#[derive(Debug, Clone)]
pub struct DocumentRules {
    pub document_type: DocumentType,
    pub fields: Vec<(IdentityField, FieldRule)>,
}

impl DocumentRules {
    pub fn pan() -> Self {
        DocumentRules {
            document_type: DocumentType::Pan,
            fields: vec![
                (
                    IdentityField::Name,
                    FieldRule::AfterAnchor { anchor: PAN_NAME_ANCHOR, offset: 1 },
                ),
                // The card prints a "Father's Name" label between the two names.
                (
                    IdentityField::FatherName,
                    FieldRule::AfterAnchor { anchor: PAN_NAME_ANCHOR, offset: 3 },
                ),
                (IdentityField::Id, FieldRule::AfterPhrase(PAN_ID_ANCHOR)),
                (IdentityField::DateOfBirth, FieldRule::FirstDate),
            ],
        }
    }

    pub fn aadhaar() -> Self {
        DocumentRules {
            document_type: DocumentType::Aadhaar,
            fields: vec![
                (IdentityField::Gender, FieldRule::Keyword(GENDER_KEYWORDS)),
                (IdentityField::DateOfBirth, FieldRule::FirstDate),
                (IdentityField::Name, FieldRule::BeforeFirstDate),
                (
                    IdentityField::Id,
                    FieldRule::FirstOf(vec![
                        FieldRule::Pattern(&AADHAAR_GROUPED_TOKEN),
                        FieldRule::TokenRun { start: &FOUR_DIGIT_TOKEN, count: 3 },
                    ]),
                ),
            ],
        }
    }

    pub fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::Pan => Self::pan(),
            DocumentType::Aadhaar => Self::aadhaar(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_pattern() {
        assert!(PAN_NUMBER.is_match("ABCDE1234F"));
        assert!(!PAN_NUMBER.is_match("ABCD1234F"));
        assert!(!PAN_NUMBER.is_match("abcde1234f"));
    }

    #[test]
    fn test_rule_tables_cover_their_fields() {
        let covers = |rules: &DocumentRules, field: IdentityField| rules.fields.iter().any(|(candidate, _)| *candidate == field);

        let pan = DocumentRules::pan();
        assert!(covers(&pan, IdentityField::FatherName));
        assert!(!covers(&pan, IdentityField::Gender));

        let aadhaar = DocumentRules::for_document(DocumentType::Aadhaar);
        assert!(covers(&aadhaar, IdentityField::Gender));
        assert!(!covers(&aadhaar, IdentityField::FatherName));
    }
}
