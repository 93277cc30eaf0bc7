//! Challenge and response records exchanged by the protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-limited challenge issued by a verifier.
///
/// Compared structurally on verification, so a caller cannot swap in a
/// forged challenge that happens to reuse a live nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofChallenge {
    /// Random positive challenge number
    pub challenge_number: u64,
    /// Single-use token binding this challenge to one verification
    pub nonce: String,
    /// When the challenge was issued
    pub issued_at: DateTime<Utc>,
    /// When the challenge stops being answerable
    pub expires_at: DateTime<Utc>,
}

impl ProofChallenge {
    /// Whether the challenge is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A prover's answer to a challenge. Never stored by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResponse {
    /// Hash of (secret key ‖ challenge number ‖ nonce)
    pub proof_hash: String,
    /// Echo of the challenge nonce
    pub nonce: String,
    /// When the proof was produced
    pub timestamp: DateTime<Utc>,
}
