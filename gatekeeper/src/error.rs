//! Error types for the gatekeeper.

use horizon::ReceptorError;
use proof_auth::AuthError;

/// Errors surfaced while configuring or operating protected entities.
///
/// Access decisions never produce these; denials are reported through
/// [`crate::AccessDecision`]. These are configuration and wiring failures.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Receptor rejected: {0}")]
    Receptor(#[from] ReceptorError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Entity already registered: {0}")]
    DuplicateEntity(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}

impl From<serde_yaml::Error> for GateError {
    fn from(err: serde_yaml::Error) -> Self {
        GateError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
