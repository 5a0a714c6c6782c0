use ekyc::models::{
    AadhaarClaim, DeclaredIdentity, DocumentRequest, DocumentType, FaceComparison, FaceRegion, KycRequest, KycStatus,
    OcrToken,
};
use ekyc::processing::{FaceDetector, FaceMatcher, ImageProcessor, TextExtractor};
use ekyc::{KycError, KycVerifier, Settings};
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tempfile::NamedTempFile;

struct CardOcr;

impl TextExtractor for CardOcr {
    fn extract_text(&self, _image_path: &Path) -> Result<Vec<OcrToken>, KycError> {
        Ok([
            ("GOVERNMENT OF INDIA", 0.95),
            ("Sita Devi", 0.9),
            ("DOB", 0.2),
            ("01/01/1985", 0.88),
            ("FEMALE", 0.91),
            ("1234 5678 9012", 0.93),
        ]
        .iter()
        .map(|(text, confidence)| OcrToken::new(*text, *confidence))
        .collect())
    }
}

struct CentreFace;

impl FaceDetector for CentreFace {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceRegion>, KycError> {
        Ok(vec![FaceRegion {
            x: image.width() / 4,
            y: image.height() / 4,
            width: image.width() / 2,
            height: image.height() / 2,
        }])
    }
}

struct FixedDistance(f64);

impl FaceMatcher for FixedDistance {
    fn compare(&self, _first: &Path, _second: &Path) -> Result<FaceComparison, KycError> {
        Ok(FaceComparison {
            verified: self.0 <= 0.4,
            distance: self.0,
            threshold: Some(0.4),
        })
    }
}

fn card_image() -> NamedTempFile {
    let img = DynamicImage::new_rgb8(40, 24);
    ImageProcessor::save_to_temp_file(&img, ImageFormat::Png).unwrap()
}

fn verifier(distance: f64) -> KycVerifier {
    KycVerifier::new(Box::new(CardOcr), Settings::default())
        .with_face_detector(Box::new(CentreFace))
        .with_face_matcher(Box::new(FixedDistance(distance)))
}

#[test]
fn combined_flow_extracts_aadhaar_and_scores() {
    let id_card = card_image();
    let selfie = card_image();
    let declared = DeclaredIdentity {
        name: "Sita Devi".to_string(),
        id_type: "AADHAR".to_string(),
        id_number: "1234 5678 9012".to_string(),
    };

    let report = verifier(0.1)
        .verify(&KycRequest::new(id_card.path(), selfie.path(), declared))
        .unwrap();

    // SITA, DEVI and the three number groups are on the card, AADHAR is not
    assert_eq!(report.verdict.id_data_match_percent, 83);
    assert_eq!(report.verdict.face_match_percent, 87);
    assert_eq!(report.verdict.kyc_status, KycStatus::Verified);
    assert!(!report.ocr_words.contains(&"DOB".to_string()));

    let record = &report.extracted_info;
    assert_eq!(record.id_type, DocumentType::Aadhaar);
    assert_eq!(record.id_number, "1234 5678 9012");
    assert_eq!(record.name, "DEVI");
    assert_eq!(record.gender.as_deref(), Some("FEMALE"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kyc_status"], "VERIFIED");
    assert_eq!(json["extracted_info"]["DOB"], "1985-01-01T00:00:00");
    assert_eq!(json["extracted_info"]["ID Type"], "AADHAR");
}

#[test]
fn combined_flow_fails_on_distant_face() {
    let id_card = card_image();
    let selfie = card_image();
    let report = verifier(0.6)
        .verify(&KycRequest::new(id_card.path(), selfie.path(), DeclaredIdentity::default()))
        .unwrap();

    assert_eq!(report.verdict.face_match_percent, 25);
    assert_eq!(report.verdict.id_data_match_percent, 0);
    assert_eq!(report.verdict.kyc_status, KycStatus::Failed);
}

#[test]
fn missing_selfie_is_rejected() {
    let id_card = card_image();
    let request = KycRequest {
        id_card: Some(id_card.path().to_path_buf()),
        face_photo: None,
        declared: DeclaredIdentity::default(),
    };
    let err = verifier(0.1).verify(&request).unwrap_err();
    assert!(err.is_client_error());
}

#[test]
fn aadhaar_checks_with_face() {
    let card = card_image();
    let selfie = card_image();
    let request = DocumentRequest {
        document_image: Some(card.path().to_path_buf()),
        face_image: Some(selfie.path().to_path_buf()),
        claim: AadhaarClaim {
            name: "Sita Devi".to_string(),
            dob: "01/01/1985".to_string(),
            gender: "Female".to_string(),
            aadhaar_number: "123456789012".to_string(),
        },
    };

    let report = verifier(0.25).verify_aadhaar(&request).unwrap();
    assert_eq!(
        report.checks,
        vec![
            "Name: ✅ Verified (Score: 100)",
            "DOB: ✅ Verified (Score: 100)",
            "Gender: ✅ Verified (Score: 100)",
            "✅ Aadhaar Number Verified",
            "Face Match: ✅ Face Match (Score: 75.0%)",
        ]
    );
}
