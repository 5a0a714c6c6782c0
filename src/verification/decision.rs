use crate::models::{KycStatus, Verdict};
use crate::settings::Thresholds;

/// Map a face-model distance onto 0-100. Within the model's threshold the
/// score falls linearly from 100 to 50; beyond it, it keeps falling at the
/// same rate and bottoms out at 0.
pub fn similarity_from_distance(distance: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 || !distance.is_finite() {
        return 0.0;
    }
    let distance = distance.max(0.0);
    if distance <= threshold {
        100.0 - (distance / threshold) * 50.0
    } else {
        (50.0 - (distance - threshold) / threshold * 50.0).max(0.0)
    }
}

/// Whole percent, truncated.
pub fn to_percent(similarity: f64) -> u8 {
    similarity.clamp(0.0, 100.0) as u8
}

/// Thresholds of the combined flow. Only the face score decides the status;
/// the text score is reported next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionPolicy {
    pub text_match_percent: u8,
    pub face_match_percent: u8,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from_thresholds(&Thresholds::default())
    }
}

impl DecisionPolicy {
    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        DecisionPolicy {
            text_match_percent: thresholds.text_match_percent,
            face_match_percent: thresholds.face_match_percent,
        }
    }

    pub fn decide(&self, id_data_match_percent: u8, face_match_percent: u8) -> Verdict {
        let details = vec![
            threshold_line("ID data match", id_data_match_percent, self.text_match_percent),
            threshold_line("Face match", face_match_percent, self.face_match_percent),
        ];

        let kyc_status = if face_match_percent >= self.face_match_percent {
            KycStatus::Verified
        } else {
            KycStatus::Failed
        };

        Verdict {
            kyc_status,
            id_data_match_percent,
            face_match_percent,
            details,
        }
    }
}

fn threshold_line(label: &str, value: u8, threshold: u8) -> String {
    let comparison = if value >= threshold { ">=" } else { "<" };
    format!("{}: {}% ({}{}%)", label, value, comparison, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_mapping() {
        assert_eq!(similarity_from_distance(0.0, 0.4), 100.0);
        assert_eq!(similarity_from_distance(0.4, 0.4), 50.0);
        assert!((similarity_from_distance(0.2, 0.4) - 75.0).abs() < 1e-9);
        assert!((similarity_from_distance(0.6, 0.4) - 25.0).abs() < 1e-9);
        assert_eq!(similarity_from_distance(2.0, 0.4), 0.0);
        assert_eq!(similarity_from_distance(0.1, 0.0), 0.0);
    }

    #[test]
    fn test_to_percent_truncates() {
        assert_eq!(to_percent(85.9), 85);
        assert_eq!(to_percent(-3.0), 0);
        assert_eq!(to_percent(130.0), 100);
    }

    #[test]
    fn test_face_gates_status() {
        let verdict = DecisionPolicy::default().decide(30, 85);
        assert_eq!(verdict.kyc_status, KycStatus::Verified);
        assert_eq!(
            verdict.details,
            vec!["ID data match: 30% (<40%)", "Face match: 85% (>=70%)"]
        );
    }

    #[test]
    fn test_text_score_does_not_rescue_face() {
        let verdict = DecisionPolicy::default().decide(100, 69);
        assert_eq!(verdict.kyc_status, KycStatus::Failed);
        assert_eq!(verdict.details[0], "ID data match: 100% (>=40%)");
        assert_eq!(verdict.details[1], "Face match: 69% (<70%)");
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert_eq!(DecisionPolicy::default().decide(0, 70).kyc_status, KycStatus::Verified);
    }
}
