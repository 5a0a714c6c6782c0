pub mod fuzzy;
pub mod identifiers;
pub mod overlap;

pub use fuzzy::{token_set_ratio, verify_field, FieldCheck, DEFAULT_FUZZY_THRESHOLD};
pub use identifiers::{extract_pan_numbers, verify_aadhaar_number, verify_pan_number, IdentifierCheck};
pub use overlap::word_overlap_percent;
