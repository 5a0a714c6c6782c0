use crate::models::OcrToken;
use crate::processing::ImageProcessor;
use crate::utils::KycError;
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

/// OCR collaborator: image in, ordered `(text, confidence)` fragments out.
pub trait TextExtractor {
    fn extract_text(&self, image_path: &Path) -> Result<Vec<OcrToken>, KycError>;
}

/// Runs the `tesseract` executable and reads its TSV word table.
#[derive(Debug, Clone)]
pub struct CommandOcrEngine {
    program: String,
    language: String,
    preprocess: bool,
}

impl CommandOcrEngine {
    pub fn new(program: impl Into<String>, language: impl Into<String>, preprocess: bool) -> Self {
        CommandOcrEngine {
            program: program.into(),
            language: language.into(),
            preprocess,
        }
    }
}

impl Default for CommandOcrEngine {
    fn default() -> Self {
        Self::new("tesseract", "eng", false)
    }
}

impl TextExtractor for CommandOcrEngine {
    fn extract_text(&self, image_path: &Path) -> Result<Vec<OcrToken>, KycError> {
        info!("Text extraction started for {}", image_path.display());

        // Keeps the preprocessed copy alive until tesseract has read it
        let prepared = if self.preprocess {
            Some(ImageProcessor::preprocess_for_ocr(image_path)?)
        } else {
            None
        };
        let input = prepared.as_ref().map(|file| file.path()).unwrap_or(image_path);

        let output = Command::new(&self.program)
            .arg(input)
            .arg("stdout")
            .args(["-l", &self.language])
            .arg("tsv")
            .output()
            .map_err(|e| KycError::Ocr(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(KycError::Ocr(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let tokens = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!("OCR produced {} fragments", tokens.len());
        Ok(tokens)
    }
}

/// In-process OCR through the libtesseract bindings.
#[cfg(feature = "tesseract")]
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    language: String,
    preprocess: bool,
}

#[cfg(feature = "tesseract")]
impl TesseractEngine {
    pub fn new(language: impl Into<String>, preprocess: bool) -> Self {
        TesseractEngine {
            language: language.into(),
            preprocess,
        }
    }
}

#[cfg(feature = "tesseract")]
impl TextExtractor for TesseractEngine {
    fn extract_text(&self, image_path: &Path) -> Result<Vec<OcrToken>, KycError> {
        use tesseract::Tesseract;

        info!("Text extraction started for {}", image_path.display());

        let prepared = if self.preprocess {
            Some(ImageProcessor::preprocess_for_ocr(image_path)?)
        } else {
            None
        };
        let input = prepared.as_ref().map(|file| file.path()).unwrap_or(image_path);
        let path_str = input
            .to_str()
            .ok_or_else(|| KycError::Ocr("Image path is not valid UTF-8".to_string()))?;

        let mut tess = Tesseract::new(None, Some(&self.language))
            .map_err(|e| KycError::Ocr(format!("Tesseract init error: {}", e)))?
            .set_image(path_str)
            .map_err(|e| KycError::Ocr(format!("Tesseract set image error: {}", e)))?
            .recognize()
            .map_err(|e| KycError::Ocr(format!("Tesseract recognition error: {}", e)))?;

        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| KycError::Ocr(format!("Tesseract TSV error: {}", e)))?;

        let tokens = parse_tsv(&tsv);
        debug!("OCR produced {} fragments", tokens.len());
        Ok(tokens)
    }
}

// TSV columns: level page block par line word left top width height conf text
const TSV_COLUMNS: usize = 12;
const WORD_LEVEL: &str = "5";

/// Group tesseract's word rows into line fragments. A fragment's confidence is
/// the mean of its word confidences rescaled to 0..=1. Lines keep the order in
/// which they first appear.
pub fn parse_tsv(tsv: &str) -> Vec<OcrToken> {
    let mut order: Vec<(String, String, String, String)> = Vec::new();
    let mut lines: HashMap<(String, String, String, String), (Vec<String>, Vec<f32>)> = HashMap::new();

    for row in tsv.lines() {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < TSV_COLUMNS || columns[0] != WORD_LEVEL {
            continue;
        }
        let text = columns[11].trim();
        let confidence = match columns[10].trim().parse::<f32>() {
            Ok(confidence) if confidence >= 0.0 => confidence,
            _ => continue,
        };
        if text.is_empty() {
            continue;
        }

        let key = (
            columns[1].to_string(),
            columns[2].to_string(),
            columns[3].to_string(),
            columns[4].to_string(),
        );
        let entry = lines.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (Vec::new(), Vec::new())
        });
        entry.0.push(text.to_string());
        entry.1.push(confidence);
    }

    order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .map(|(words, confidences)| {
            let mean = confidences.iter().sum::<f32>() / confidences.len() as f32;
            OcrToken::new(words.join(" "), (mean / 100.0).clamp(0.0, 1.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t400\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t300\t20\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t80\t20\t96.0\tPermanent
5\t1\t1\t1\t1\t2\t95\t10\t80\t20\t90.0\tAccount
5\t1\t1\t1\t2\t1\t10\t40\t120\t20\t40\tABCDE1234F
5\t1\t1\t1\t2\t2\t140\t40\t10\t20\t-1\t
5\t1\t2\t1\t1\t1\t10\t90\t50\t20\t20.5\t~~
";

    #[test]
    fn test_parse_tsv_groups_lines() {
        let tokens = parse_tsv(TSV);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "Permanent Account");
        assert!((tokens[0].confidence - 0.93).abs() < 1e-4);
        assert_eq!(tokens[1].text, "ABCDE1234F");
        assert!((tokens[1].confidence - 0.40).abs() < 1e-4);
        assert_eq!(tokens[2].text, "~~");
    }

    #[test]
    fn test_parse_tsv_ignores_garbage() {
        assert!(parse_tsv("").is_empty());
        assert!(parse_tsv("not a tsv table\n5\t1").is_empty());
    }

    #[test]
    fn test_missing_program_is_an_ocr_error() {
        let engine = CommandOcrEngine::new("ekyc-no-such-ocr-binary", "eng", false);
        let err = engine.extract_text(Path::new("card.jpg")).unwrap_err();
        assert!(matches!(err, KycError::Ocr(_)));
    }
}
