use crate::models::*;
use crate::processing::extractors::DocumentExtractor;
use crate::processing::normalizer::{self, NormalizePolicy};
use crate::processing::{
    extract_identity, CommandFaceDetector, CommandFaceMatcher, CommandOcrEngine, FaceCrop, FaceDetector, FaceMatcher,
    ImageProcessor, TextExtractor,
};
#[cfg(feature = "tesseract")]
use crate::processing::TesseractEngine;
use crate::settings::{OcrBackend, Settings};
use crate::utils::KycError;
use crate::validation::word_overlap_percent;
use crate::verification::{aadhaar_checks, face_line, pan_checks, similarity_from_distance, to_percent, DecisionPolicy};
use log::{debug, error, info, warn};
use std::path::Path;

/// Runs the three verification flows over pluggable OCR and face collaborators.
///
/// Only missing inputs are reported as errors. Collaborator failures are
/// logged and turned into empty text or a zero face score so that every
/// request still ends with a report.
pub struct KycVerifier {
    ocr: Box<dyn TextExtractor>,
    face_detector: Option<Box<dyn FaceDetector>>,
    face_matcher: Option<Box<dyn FaceMatcher>>,
    settings: Settings,
}

impl KycVerifier {
    pub fn new(ocr: Box<dyn TextExtractor>, settings: Settings) -> Self {
        KycVerifier {
            ocr,
            face_detector: None,
            face_matcher: None,
            settings,
        }
    }

    pub fn with_face_detector(mut self, detector: Box<dyn FaceDetector>) -> Self {
        self.face_detector = Some(detector);
        self
    }

    pub fn with_face_matcher(mut self, matcher: Box<dyn FaceMatcher>) -> Self {
        self.face_matcher = Some(matcher);
        self
    }

    /// Build the collaborators named in `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self, KycError> {
        let ocr: Box<dyn TextExtractor> = match settings.ocr_backend {
            OcrBackend::Command => Box::new(CommandOcrEngine::new(
                settings.ocr_program.clone(),
                settings.ocr_language.clone(),
                settings.ocr_preprocess,
            )),
            #[cfg(feature = "tesseract")]
            OcrBackend::Library => Box::new(TesseractEngine::new(
                settings.ocr_language.clone(),
                settings.ocr_preprocess,
            )),
            #[cfg(not(feature = "tesseract"))]
            OcrBackend::Library => {
                return Err(KycError::Config(
                    "ocr.backend = \"library\" needs the `tesseract` feature".to_string(),
                ))
            }
        };

        let mut verifier = KycVerifier::new(ocr, settings.clone());
        if !settings.face_detector.is_empty() {
            verifier = verifier.with_face_detector(Box::new(CommandFaceDetector::new(settings.face_detector)?));
        }
        if !settings.face_matcher.is_empty() {
            verifier = verifier.with_face_matcher(Box::new(CommandFaceMatcher::new(settings.face_matcher)?));
        }
        Ok(verifier)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Combined flow: extract fields from the ID card, score the declared
    /// fields against the OCR words and let the face score decide.
    pub fn verify(&self, request: &KycRequest) -> Result<KycReport, KycError> {
        let id_card = require_image(request.id_card.as_deref(), "ID card image")?;
        let face_photo = require_image(request.face_photo.as_deref(), "face photo")?;

        // Held until the comparison below is done; the file goes with it
        let id_face = self.crop_id_face(id_card);

        let raw_text = self.read_raw_text(id_card);
        let ocr_words = normalizer::normalize(&raw_text, NormalizePolicy::Strict);
        let declared = &request.declared;
        let declared_words =
            normalizer::declared_words(&[&declared.name, &declared.id_type, &declared.id_number]);
        let id_data_match_percent = word_overlap_percent(&declared_words, &ocr_words);

        let extracted_info = extract_identity(&raw_text, None);

        let similarity = match &id_face {
            Some(crop) => self.face_similarity(face_photo, crop.path()),
            None => 0.0,
        };

        let verdict = DecisionPolicy::from_thresholds(&self.settings.thresholds)
            .decide(id_data_match_percent, to_percent(similarity));
        info!(
            "KYC {}: id data {}%, face {}%",
            verdict.kyc_status, verdict.id_data_match_percent, verdict.face_match_percent
        );

        Ok(KycReport {
            verdict,
            extracted_info,
            ocr_words,
            user_input: declared.clone(),
            saved_images: SavedImages {
                id_card: id_card.to_path_buf(),
                face_photo: face_photo.to_path_buf(),
            },
        })
    }

    pub fn verify_aadhaar(&self, request: &DocumentRequest<AadhaarClaim>) -> Result<DocumentCheckReport, KycError> {
        let document = require_image(request.document_image.as_deref(), "Aadhaar image")?;
        let face = optional_image(request.face_image.as_deref(), "face image")?;

        let text = self.read_clean_text(document);
        let mut checks = aadhaar_checks(&request.claim, &text, self.settings.thresholds.fuzzy_score);
        if let Some(face) = face {
            checks.push(self.document_face_line(document, face));
        }

        Ok(DocumentCheckReport {
            document: DocumentType::Aadhaar,
            checks,
        })
    }

    pub fn verify_pan(&self, request: &DocumentRequest<PanClaim>) -> Result<DocumentCheckReport, KycError> {
        let document = require_image(request.document_image.as_deref(), "PAN image")?;
        let face = optional_image(request.face_image.as_deref(), "face image")?;

        let text = self.read_clean_text(document);
        let mut checks = pan_checks(&request.claim, &text, self.settings.thresholds.fuzzy_score);
        if let Some(face) = face {
            checks.push(self.document_face_line(document, face));
        }

        Ok(DocumentCheckReport {
            document: DocumentType::Pan,
            checks,
        })
    }

    /// OCR an image and run the extractors without any declared data.
    pub fn extract(&self, image: Option<&Path>, document_type: Option<DocumentType>) -> Result<ExtractionReport, KycError> {
        let image = require_image(image, "document image")?;
        Ok(Self::extract_from_text(self.read_raw_text(image), document_type))
    }

    /// Extraction over already delimited OCR text (`|fragment|fragment|`).
    pub fn extract_from_text(raw_text: String, document_type: Option<DocumentType>) -> ExtractionReport {
        let pan = DocumentExtractor::pan().extract(&raw_text);
        let aadhaar = DocumentExtractor::aadhaar().extract(&raw_text);
        let selected = extract_identity(&raw_text, document_type);
        ExtractionReport {
            raw_text,
            pan,
            aadhaar,
            selected,
        }
    }

    fn read_tokens(&self, image: &Path) -> Vec<OcrToken> {
        match self.ocr.extract_text(image) {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Text extraction error: {}", e);
                Vec::new()
            }
        }
    }

    /// Confidence-filtered delimited text; `|` when OCR failed.
    fn read_raw_text(&self, image: &Path) -> String {
        let tokens = self.read_tokens(image);
        let raw_text = normalizer::join_tokens(&tokens, self.settings.ocr_confidence_threshold);
        info!("Extracted text: {}", raw_text);
        raw_text
    }

    /// All recognised text, lowercased with collapsed whitespace.
    fn read_clean_text(&self, image: &Path) -> String {
        let tokens = self.read_tokens(image);
        normalizer::clean_text(&normalizer::plain_text(&tokens))
    }

    fn crop_id_face(&self, id_card: &Path) -> Option<FaceCrop> {
        info!("Extracting face...");
        let Some(detector) = &self.face_detector else {
            warn!("No face detector configured, face comparison skipped");
            return None;
        };

        let crop = ImageProcessor::open(id_card)
            .and_then(|img| {
                let regions = detector.detect(&img)?;
                ImageProcessor::crop_largest_face(&img, &regions, self.settings.face_crop_scale)
            });

        match crop {
            Ok(Some(crop)) => {
                debug!("ID face region: {:?}", crop.region);
                Some(crop)
            }
            Ok(None) => {
                warn!("No face detected");
                None
            }
            Err(e) => {
                error!("Face extraction error: {}", e);
                None
            }
        }
    }

    /// Similarity in 0..=100 between the selfie and the ID face crop.
    fn face_similarity(&self, selfie: &Path, id_face: &Path) -> f64 {
        if !(selfie.exists() && id_face.exists()) {
            return 0.0;
        }
        let Some(matcher) = &self.face_matcher else {
            warn!("No face matcher configured, face comparison skipped");
            return 0.0;
        };

        match matcher.compare(selfie, id_face) {
            Ok(comparison) => {
                let threshold = comparison
                    .threshold
                    .filter(|threshold| *threshold > 0.0)
                    .unwrap_or(self.settings.thresholds.default_distance_threshold);
                let similarity = similarity_from_distance(comparison.distance, threshold);
                debug!(
                    "Face comparison: verified={} distance={} threshold={} similarity={:.2}",
                    comparison.verified, comparison.distance, threshold, similarity
                );
                similarity
            }
            Err(e) => {
                error!("Face verification error: {}", e);
                0.0
            }
        }
    }

    fn document_face_line(&self, document: &Path, face: &Path) -> String {
        let comparison = match &self.face_matcher {
            Some(matcher) => matcher.compare(document, face),
            None => Err(KycError::Config("no face matcher configured".to_string())),
        };
        face_line(comparison, self.settings.thresholds.face_score)
    }
}

fn require_image<'a>(path: Option<&'a Path>, label: &str) -> Result<&'a Path, KycError> {
    let path = path.ok_or_else(|| KycError::MissingInput(format!("{} is required", label)))?;
    if !path.is_file() {
        return Err(KycError::MissingInput(format!("{} not found: {}", label, path.display())));
    }
    Ok(path)
}

fn optional_image<'a>(path: Option<&'a Path>, label: &str) -> Result<Option<&'a Path>, KycError> {
    path.map(|path| require_image(Some(path), label)).transpose()
}
