use crate::models::{FaceComparison, FaceRegion};
use crate::processing::ImageProcessor;
use crate::utils::KycError;
use image::{DynamicImage, ImageFormat};
use log::debug;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::process::Command;

/// Face-detection collaborator.
pub trait FaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceRegion>, KycError>;
}

/// Face-similarity collaborator comparing the faces in two image files.
pub trait FaceMatcher {
    fn compare(&self, first: &Path, second: &Path) -> Result<FaceComparison, KycError>;
}

/// Detector backed by an external program. It gets an image path as its last
/// argument and prints a JSON array of `[x, y, width, height]` boxes.
#[derive(Debug, Clone)]
pub struct CommandFaceDetector {
    command: Vec<String>,
}

impl CommandFaceDetector {
    pub fn new(command: Vec<String>) -> Result<Self, KycError> {
        if command.is_empty() {
            return Err(KycError::Config("face detector command is empty".to_string()));
        }
        Ok(CommandFaceDetector { command })
    }
}

impl FaceDetector for CommandFaceDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceRegion>, KycError> {
        let input = ImageProcessor::save_to_temp_file(image, ImageFormat::Png)?;
        let regions: Vec<FaceRegion> = run_json_command(&self.command, &[input.path()])
            .map_err(|e| KycError::FaceDetection(e.to_string()))?;
        debug!("Face detector returned {} regions", regions.len());
        Ok(regions)
    }
}

/// Matcher backed by an external program. It gets both image paths and prints
/// `{"verified": bool, "distance": float, "threshold": float}`. A program that
/// cannot find a face in either image should exit with status 3.
#[derive(Debug, Clone)]
pub struct CommandFaceMatcher {
    command: Vec<String>,
}

const NO_FACE_EXIT_CODE: i32 = 3;

impl CommandFaceMatcher {
    pub fn new(command: Vec<String>) -> Result<Self, KycError> {
        if command.is_empty() {
            return Err(KycError::Config("face matcher command is empty".to_string()));
        }
        Ok(CommandFaceMatcher { command })
    }
}

impl FaceMatcher for CommandFaceMatcher {
    fn compare(&self, first: &Path, second: &Path) -> Result<FaceComparison, KycError> {
        run_json_command(&self.command, &[first, second]).map_err(|e| match e {
            CommandFailure::Exit(Some(NO_FACE_EXIT_CODE), stderr) => KycError::NoFaceDetected(stderr),
            other => KycError::FaceComparison(other.to_string()),
        })
    }
}

#[derive(Debug)]
enum CommandFailure {
    Spawn(String),
    Exit(Option<i32>, String),
    Output(String),
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CommandFailure::Spawn(msg) => write!(f, "failed to start: {}", msg),
            CommandFailure::Exit(code, stderr) => write!(f, "exit code {:?}: {}", code, stderr),
            CommandFailure::Output(msg) => write!(f, "unreadable output: {}", msg),
        }
    }
}

fn run_json_command<T: DeserializeOwned>(command: &[String], paths: &[&Path]) -> Result<T, CommandFailure> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| CommandFailure::Spawn("empty command".to_string()))?;

    let output = Command::new(program)
        .args(args)
        .args(paths)
        .output()
        .map_err(|e| CommandFailure::Spawn(format!("{}: {}", program, e)))?;

    if !output.status.success() {
        return Err(CommandFailure::Exit(
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| CommandFailure::Output(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_commands_rejected() {
        assert!(matches!(CommandFaceDetector::new(vec![]), Err(KycError::Config(_))));
        assert!(matches!(CommandFaceMatcher::new(vec![]), Err(KycError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_matcher_reads_json() {
        let matcher = CommandFaceMatcher::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"echo '{"verified": true, "distance": 0.1, "threshold": 0.4}'"#.to_string(),
            "matcher".to_string(),
        ])
        .unwrap();
        let comparison = matcher.compare(Path::new("a.jpg"), Path::new("b.jpg")).unwrap();
        assert!(comparison.verified);
        assert_eq!(comparison.threshold, Some(0.4));
    }

    #[cfg(unix)]
    #[test]
    fn test_matcher_no_face_exit_code() {
        let matcher = CommandFaceMatcher::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'no face' >&2; exit 3".to_string(),
            "matcher".to_string(),
        ])
        .unwrap();
        let err = matcher.compare(Path::new("a.jpg"), Path::new("b.jpg")).unwrap_err();
        assert!(matches!(err, KycError::NoFaceDetected(msg) if msg == "no face"));
    }

    #[cfg(unix)]
    #[test]
    fn test_detector_reads_boxes() {
        let detector = CommandFaceDetector::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo '[[1, 2, 3, 4], [5, 6, 7, 8]]'".to_string(),
            "detector".to_string(),
        ])
        .unwrap();
        let img = DynamicImage::new_rgb8(8, 8);
        let regions = detector.detect(&img).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[1].width, 7);
    }
}
