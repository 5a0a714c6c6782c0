pub mod kyc_verifier;
pub mod models;
pub mod processing;
pub mod settings;
pub mod utils;
pub mod validation;
pub mod verification;

pub use kyc_verifier::KycVerifier;
pub use settings::{load_settings, Settings};
pub use utils::KycError;
