use crate::models::rules::{AADHAAR_NUMBER_IN_TEXT, PAN_NUMBER};
use crate::models::DocumentType;
use std::fmt;

/// Every PAN-shaped word in `text`, compared in uppercase.
pub fn extract_pan_numbers(text: &str) -> Vec<String> {
    PAN_NUMBER
        .find_iter(&text.to_uppercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Whether `text` carries something shaped like an Aadhaar number.
pub fn has_aadhaar_number(text: &str) -> bool {
    AADHAAR_NUMBER_IN_TEXT.is_match(text)
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Exact (non-fuzzy) check of a declared document number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierCheck {
    pub document: DocumentType,
    pub verified: bool,
}

impl fmt::Display for IdentifierCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.document {
            DocumentType::Aadhaar => "Aadhaar",
            DocumentType::Pan => "PAN",
        };
        if self.verified {
            write!(f, "✅ {} Number Verified", name)
        } else {
            write!(f, "❌ {} Number Not Verified", name)
        }
    }
}

/// Declared Aadhaar number found in `text` once spacing is ignored on both
/// sides. An empty declaration never verifies.
pub fn verify_aadhaar_number(declared: &str, text: &str) -> IdentifierCheck {
    let declared = strip_whitespace(declared);
    // A plain substring test would accept "" against any card
    IdentifierCheck {
        document: DocumentType::Aadhaar,
        verified: !declared.is_empty() && strip_whitespace(text).contains(&declared),
    }
}

/// Declared PAN equals one of the PAN-shaped words in `text`.
pub fn verify_pan_number(declared: &str, text: &str) -> IdentifierCheck {
    let declared = declared.trim().to_uppercase();
    IdentifierCheck {
        document: DocumentType::Pan,
        verified: extract_pan_numbers(text).contains(&declared),
    }
}
