// Check sequences of the single-document flows. Every line is evaluated on its
// own; the sequence carries no overall verdict.

use crate::models::{AadhaarClaim, FaceComparison, PanClaim};
use crate::utils::KycError;
use crate::validation::identifiers::has_aadhaar_number;
use crate::validation::{extract_pan_numbers, verify_aadhaar_number, verify_field, verify_pan_number};

pub const AADHAAR_PATTERN_MISSING: &str = "❌ Aadhaar number pattern not found.";
pub const PAN_FORMAT_MISSING: &str = "❌ PAN number format not found.";
pub const PAN_FORMAT_DETECTED: &str = "✅ PAN format detected.";
pub const FACE_NOT_DETECTED: &str = "❌ Face not detected in one or both images.";

/// Field checks of an Aadhaar card against its cleaned OCR text.
pub fn aadhaar_checks(claim: &AadhaarClaim, text: &str, fuzzy_threshold: u8) -> Vec<String> {
    if !has_aadhaar_number(text) {
        return vec![AADHAAR_PATTERN_MISSING.to_string()];
    }
    vec![
        verify_field("Name", &claim.name, text, fuzzy_threshold).to_string(),
        verify_field("DOB", &claim.dob, text, fuzzy_threshold).to_string(),
        verify_field("Gender", &claim.gender, text, fuzzy_threshold).to_string(),
        verify_aadhaar_number(&claim.aadhaar_number, text).to_string(),
    ]
}

/// Field checks of a PAN card against its cleaned OCR text.
pub fn pan_checks(claim: &PanClaim, text: &str, fuzzy_threshold: u8) -> Vec<String> {
    if extract_pan_numbers(text).is_empty() {
        return vec![PAN_FORMAT_MISSING.to_string()];
    }
    vec![
        PAN_FORMAT_DETECTED.to_string(),
        verify_field("Name", &claim.name, text, fuzzy_threshold).to_string(),
        verify_field("Father Name", &claim.father_name, text, fuzzy_threshold).to_string(),
        verify_field("DOB", &claim.dob, text, fuzzy_threshold).to_string(),
        verify_pan_number(&claim.pan_number, text).to_string(),
    ]
}

/// Report line for a document-versus-selfie comparison. The score here is
/// `1 - distance`, independent of the combined flow's percentage mapping.
pub fn face_line(comparison: Result<FaceComparison, KycError>, min_score: f64) -> String {
    match comparison {
        Ok(comparison) => {
            let score = 1.0 - comparison.distance;
            let result = if score >= min_score {
                "✅ Face Match"
            } else {
                "❌ Face Mismatch"
            };
            format!("Face Match: {} (Score: {}%)", result, format_score(score * 100.0))
        }
        Err(KycError::NoFaceDetected(_)) => FACE_NOT_DETECTED.to_string(),
        Err(err) => format!("❌ Face match error: {}", err),
    }
}

/// Two decimals at most, always at least one.
fn format_score(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}
