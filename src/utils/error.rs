use thiserror::Error;

#[derive(Debug, Error)]
pub enum KycError {
    #[error("Missing input: {0}")]
    MissingInput(String),
    #[error("Image processing error: {0}")]
    ImageProcessing(String),
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("Face detection error: {0}")]
    FaceDetection(String),
    #[error("Face comparison error: {0}")]
    FaceComparison(String),
    #[error("No face detected: {0}")]
    NoFaceDetected(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KycError {
    /// Errors the caller caused, as opposed to collaborator or environment failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, KycError::MissingInput(_))
    }
}
