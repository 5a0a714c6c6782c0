pub mod extractors;
pub mod face;
pub mod image;
pub mod normalizer;
pub mod ocr;

pub use extractors::{extract_identity, DocumentExtractor};
pub use face::{CommandFaceDetector, CommandFaceMatcher, FaceDetector, FaceMatcher};
pub use self::image::{FaceCrop, ImageProcessor};
pub use normalizer::NormalizePolicy;
pub use ocr::{CommandOcrEngine, TextExtractor};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractEngine;
