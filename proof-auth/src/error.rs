//! Error types for the challenge/response protocol.

/// Protocol failures.
///
/// Each variant is a distinct, caller-visible kind so an operator can tell
/// "too fast" apart from "stale" apart from "wrong secret".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Too many attempts from one source inside the window
    #[error("Rate limit exceeded for {source_id}: maximum {max_attempts} attempts per {window_secs}s")]
    RateLimitExceeded {
        source_id: String,
        max_attempts: usize,
        window_secs: u64,
    },

    /// Challenge passed its expiry time
    #[error("Challenge has expired")]
    ChallengeExpired,

    /// Nonce unknown, already consumed, or challenge does not match the issued one
    #[error("Invalid challenge")]
    InvalidChallenge,

    /// Proof timestamp too far from the verifier's clock
    #[error("Proof timestamp out of range (skew {skew_ms}ms)")]
    TimestampOutOfRange { skew_ms: i64 },

    /// Claimed commitment is not ours
    #[error("Public commitment mismatch")]
    CommitmentMismatch,

    /// Proof hash does not answer the challenge
    #[error("Proof does not match challenge")]
    InvalidProof,

    /// Key derivation could not run with the configured parameters
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

impl AuthError {
    /// Whether the caller was throttled rather than wrong.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AuthError::RateLimitExceeded { .. })
    }

    /// Whether the challenge was stale.
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::ChallengeExpired)
    }

    /// Short machine-readable label for audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::RateLimitExceeded { .. } => "rate_limit_exceeded",
            AuthError::ChallengeExpired => "challenge_expired",
            AuthError::InvalidChallenge => "invalid_challenge",
            AuthError::TimestampOutOfRange { .. } => "timestamp_out_of_range",
            AuthError::CommitmentMismatch => "commitment_mismatch",
            AuthError::InvalidProof => "invalid_proof",
            AuthError::KeyDerivation(_) => "key_derivation",
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
