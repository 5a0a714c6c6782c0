use crate::utils::KycError;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_SETTINGS_FILE: &str = "ekyc.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// The `tesseract` executable.
    Command,
    /// libtesseract bindings, available with the `tesseract` feature.
    Library,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Advisory text-match line cut-off, percent.
    pub text_match_percent: u8,
    /// Face similarity needed for a VERIFIED combined verdict, percent.
    pub face_match_percent: u8,
    /// Fuzzy field score needed on the single-document checks.
    pub fuzzy_score: u8,
    /// `1 - distance` needed on the single-document face line.
    pub face_score: f64,
    /// Used when the face matcher does not report its own threshold.
    pub default_distance_threshold: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            text_match_percent: 40,
            face_match_percent: 70,
            fuzzy_score: 85,
            face_score: 0.60,
            default_distance_threshold: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ocr_backend: OcrBackend,
    pub ocr_program: String,
    pub ocr_language: String,
    pub ocr_confidence_threshold: f32,
    pub ocr_preprocess: bool,
    pub face_detector: Vec<String>,
    pub face_matcher: Vec<String>,
    pub face_crop_scale: f64,
    pub thresholds: Thresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ocr_backend: OcrBackend::Command,
            ocr_program: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            ocr_confidence_threshold: 0.3,
            ocr_preprocess: false,
            face_detector: Vec::new(),
            face_matcher: Vec::new(),
            face_crop_scale: crate::processing::image::FACE_CROP_SCALE,
            thresholds: Thresholds::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    ocr: Option<OcrSection>,
    face: Option<FaceSection>,
    thresholds: Option<ThresholdsSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OcrSection {
    backend: Option<OcrBackend>,
    program: Option<String>,
    language: Option<String>,
    confidence_threshold: Option<f32>,
    preprocess: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FaceSection {
    detector: Option<Vec<String>>,
    matcher: Option<Vec<String>>,
    crop_scale: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdsSection {
    text_match_percent: Option<u8>,
    face_match_percent: Option<u8>,
    fuzzy_score: Option<u8>,
    face_score: Option<f64>,
    default_distance_threshold: Option<f64>,
}

impl Settings {
    /// Overlay the values present in a TOML document.
    pub fn merge_toml(&mut self, content: &str) -> Result<(), KycError> {
        let parsed: SettingsFile =
            toml::from_str(content).map_err(|e| KycError::Config(format!("invalid settings: {}", e)))?;

        if let Some(ocr) = parsed.ocr {
            if let Some(backend) = ocr.backend {
                self.ocr_backend = backend;
            }
            if let Some(program) = ocr.program {
                self.ocr_program = program;
            }
            if let Some(language) = ocr.language {
                self.ocr_language = language;
            }
            if let Some(threshold) = ocr.confidence_threshold {
                self.ocr_confidence_threshold = threshold;
            }
            if let Some(preprocess) = ocr.preprocess {
                self.ocr_preprocess = preprocess;
            }
        }

        if let Some(face) = parsed.face {
            if let Some(detector) = face.detector {
                self.face_detector = detector;
            }
            if let Some(matcher) = face.matcher {
                self.face_matcher = matcher;
            }
            if let Some(scale) = face.crop_scale {
                self.face_crop_scale = scale;
            }
        }

        if let Some(thresholds) = parsed.thresholds {
            let current = &mut self.thresholds;
            current.text_match_percent = thresholds.text_match_percent.unwrap_or(current.text_match_percent);
            current.face_match_percent = thresholds.face_match_percent.unwrap_or(current.face_match_percent);
            current.fuzzy_score = thresholds.fuzzy_score.unwrap_or(current.fuzzy_score);
            current.face_score = thresholds.face_score.unwrap_or(current.face_score);
            current.default_distance_threshold = thresholds
                .default_distance_threshold
                .unwrap_or(current.default_distance_threshold);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), KycError> {
        if !(0.0..=1.0).contains(&self.ocr_confidence_threshold) {
            return Err(KycError::Config(format!(
                "ocr.confidence_threshold must be within 0..=1, got {}",
                self.ocr_confidence_threshold
            )));
        }
        if self.face_crop_scale < 1.0 {
            return Err(KycError::Config(format!(
                "face.crop_scale must be at least 1.0, got {}",
                self.face_crop_scale
            )));
        }
        let percents = [
            ("thresholds.text_match_percent", self.thresholds.text_match_percent),
            ("thresholds.face_match_percent", self.thresholds.face_match_percent),
            ("thresholds.fuzzy_score", self.thresholds.fuzzy_score),
        ];
        if let Some((name, value)) = percents.iter().find(|(_, value)| *value > 100) {
            return Err(KycError::Config(format!("{} must be at most 100, got {}", name, value)));
        }
        if self.thresholds.default_distance_threshold <= 0.0 {
            return Err(KycError::Config(
                "thresholds.default_distance_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults, then `ekyc.toml` in the working directory if present, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings, KycError> {
    let mut settings = Settings::default();

    let mut paths = Vec::new();
    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.exists() {
        paths.push(local);
    }
    if let Some(path) = extra_path {
        if !path.exists() {
            return Err(KycError::Config(format!("settings file not found: {}", path.display())));
        }
        paths.push(path.to_path_buf());
    }

    for path in paths {
        debug!("Loading settings from {}", path.display());
        let content = fs::read_to_string(&path)?;
        settings
            .merge_toml(&content)
            .map_err(|e| KycError::Config(format!("{}: {}", path.display(), e)))?;
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.ocr_confidence_threshold, 0.3);
        assert_eq!(settings.thresholds.face_match_percent, 70);
        assert_eq!(settings.thresholds.text_match_percent, 40);
        assert_eq!(settings.thresholds.fuzzy_score, 85);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_merge_keeps_unset_values() {
        let mut settings = Settings::default();
        settings
            .merge_toml(
                r#"
                [ocr]
                language = "eng+hin"

                [face]
                matcher = ["python3", "face_verify.py"]

                [thresholds]
                fuzzy_score = 90
                "#,
            )
            .unwrap();
        assert_eq!(settings.ocr_language, "eng+hin");
        assert_eq!(settings.ocr_program, "tesseract");
        assert_eq!(settings.face_matcher, vec!["python3", "face_verify.py"]);
        assert_eq!(settings.thresholds.fuzzy_score, 90);
        assert_eq!(settings.thresholds.face_match_percent, 70);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let mut settings = Settings::default();
        let err = settings.merge_toml("[ocr]\nconfidence = 0.5\n").unwrap_err();
        assert!(matches!(err, KycError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.ocr_confidence_threshold = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.thresholds.fuzzy_score = 120;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[thresholds]\nface_match_percent = 80").unwrap();
        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.thresholds.face_match_percent, 80);

        let missing = load_settings(Some(Path::new("/nonexistent/ekyc.toml")));
        assert!(matches!(missing, Err(KycError::Config(_))));
    }
}
