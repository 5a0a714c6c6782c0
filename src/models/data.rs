use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One recognised text fragment as reported by the OCR engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    pub confidence: f32, // 0.0..=1.0
}

impl OcrToken {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        OcrToken {
            text: text.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "PAN")]
    Pan,
    // Spelling follows the label the records have always carried
    #[serde(rename = "AADHAR")]
    Aadhaar,
}

impl DocumentType {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Pan => "PAN",
            DocumentType::Aadhaar => "AADHAR",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PAN" => Ok(DocumentType::Pan),
            "AADHAR" | "AADHAAR" => Ok(DocumentType::Aadhaar),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

/// Structured identity fields pulled out of an OCR token stream.
///
/// Variant-specific fields are `Some` only for the document type that carries
/// them: `father_name` for PAN, `gender` for Aadhaar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityRecord {
    #[serde(rename = "ID")]
    pub id_number: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Father's Name", skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    #[serde(rename = "Gender", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(rename = "DOB", serialize_with = "serialize_dob")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(rename = "ID Type")]
    pub id_type: DocumentType,
}

impl IdentityRecord {
    /// An empty record with the key set of `id_type`.
    pub fn empty(id_type: DocumentType) -> Self {
        let (father_name, gender) = match id_type {
            DocumentType::Pan => (Some(String::new()), None),
            DocumentType::Aadhaar => (None, Some(String::new())),
        };
        IdentityRecord {
            id_number: String::new(),
            name: String::new(),
            father_name,
            gender,
            date_of_birth: None,
            id_type,
        }
    }

    /// Number of fields holding a value. `ID Type` always counts.
    pub fn populated_fields(&self) -> usize {
        let text_fields = [
            Some(&self.id_number),
            Some(&self.name),
            self.father_name.as_ref(),
            self.gender.as_ref(),
        ];
        let filled = text_fields
            .iter()
            .flatten()
            .filter(|value| !value.is_empty())
            .count();
        filled + usize::from(self.date_of_birth.is_some()) + 1
    }
}

fn serialize_dob<S: Serializer>(dob: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
    match dob {
        Some(date) => serializer.serialize_str(&date.format("%Y-%m-%dT00:00:00").to_string()),
        None => serializer.serialize_str(""),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KycStatus {
    Verified,
    Failed,
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KycStatus::Verified => f.write_str("VERIFIED"),
            KycStatus::Failed => f.write_str("FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub kyc_status: KycStatus,
    pub id_data_match_percent: u8,
    pub face_match_percent: u8,
    pub details: Vec<String>,
}

/// Axis-aligned face box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "[u32; 4]")]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl From<[u32; 4]> for FaceRegion {
    fn from([x, y, width, height]: [u32; 4]) -> Self {
        FaceRegion {
            x,
            y,
            width,
            height,
        }
    }
}

/// Raw answer of the face-similarity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FaceComparison {
    pub verified: bool,
    pub distance: f64,
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Fields the applicant typed in for the combined flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeclaredIdentity {
    pub name: String,
    pub id_type: String,
    pub id_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedImages {
    pub id_card: PathBuf,
    pub face_photo: PathBuf,
}

#[derive(Debug, Clone)]
pub struct KycRequest {
    pub id_card: Option<PathBuf>,
    pub face_photo: Option<PathBuf>,
    pub declared: DeclaredIdentity,
}

impl KycRequest {
    pub fn new(id_card: impl Into<PathBuf>, face_photo: impl Into<PathBuf>, declared: DeclaredIdentity) -> Self {
        KycRequest {
            id_card: Some(id_card.into()),
            face_photo: Some(face_photo.into()),
            declared,
        }
    }
}

/// Full response of the combined flow.
#[derive(Debug, Clone, Serialize)]
pub struct KycReport {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub extracted_info: IdentityRecord,
    pub ocr_words: Vec<String>,
    pub user_input: DeclaredIdentity,
    pub saved_images: SavedImages,
}

/// Both extractor outputs for one OCR text, plus the record fusion picked.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub raw_text: String,
    pub pan: IdentityRecord,
    pub aadhaar: IdentityRecord,
    pub selected: IdentityRecord,
}

#[derive(Debug, Clone, Default)]
pub struct AadhaarClaim {
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub aadhaar_number: String,
}

#[derive(Debug, Clone, Default)]
pub struct PanClaim {
    pub name: String,
    pub dob: String,
    pub father_name: String,
    pub pan_number: String,
}

#[derive(Debug, Clone)]
pub struct DocumentRequest<C> {
    pub document_image: Option<PathBuf>,
    pub face_image: Option<PathBuf>,
    pub claim: C,
}

/// Ordered, independently evaluated checks of a single-document flow.
/// There is deliberately no overall verdict here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentCheckReport {
    pub document: DocumentType,
    pub checks: Vec<String>,
}
