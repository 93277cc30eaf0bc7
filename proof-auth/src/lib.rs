//! Challenge/response authentication for CFIR entities
//!
//! An entity proves knowledge of a secret credential without sending it:
//!
//! 1. The verifier issues a [`ProofChallenge`] (random number + single-use
//!    nonce, valid for a short window)
//! 2. The prover answers with a [`ProofResponse`] whose hash binds its
//!    Argon2id-derived key to that challenge
//! 3. The verifier checks freshness, the public commitment and the hash, then
//!    consumes the nonce so the proof can never be replayed
//!
//! Issuance and verification are rate limited per source.
//!
//! # Example
//!
//! ```
//! use proof_auth::{AuthenticatorConfig, ChallengeAuthenticator, KdfConfig};
//!
//! let config = AuthenticatorConfig {
//!     kdf: KdfConfig::insecure_fast(),
//!     ..Default::default()
//! };
//! let auth = ChallengeAuthenticator::new("correct horse battery staple", config).unwrap();
//!
//! let challenge = auth.generate_challenge("10.0.0.1").unwrap();
//! let proof = auth.generate_proof(&challenge).unwrap();
//! assert!(auth
//!     .verify_proof(&proof, &challenge, auth.commitment(), "10.0.0.1")
//!     .unwrap());
//! ```

pub mod authenticator;
pub mod challenge;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod rate_limit;

// Re-export main types
pub use authenticator::ChallengeAuthenticator;
pub use challenge::{ProofChallenge, ProofResponse};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthenticatorConfig, KdfConfig};
pub use error::{AuthError, Result};
pub use rate_limit::RateLimiter;
