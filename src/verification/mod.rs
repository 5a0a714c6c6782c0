pub mod decision;
pub mod documents;

pub use decision::{similarity_from_distance, to_percent, DecisionPolicy};
pub use documents::{aadhaar_checks, face_line, pan_checks};
