//! The challenge/response authenticator.
//!
//! Each issued challenge moves through
//! `Issued → {Consumed-Valid, Expired}`: a successful verification deletes the
//! nonce, and an expiry sweep deletes anything past `expires_at`. Failed
//! verifications leave the nonce outstanding so callers still see the
//! difference between "expired" and "wrong". A nonce that has left the table
//! can never verify again.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::challenge::{ProofChallenge, ProofResponse};
use crate::clock::{saturating_add, Clock, SystemClock};
use crate::config::AuthenticatorConfig;
use crate::crypto::{self, SecretKey};
use crate::error::{AuthError, Result};
use crate::rate_limit::RateLimiter;

/// Outstanding challenges and the rate-limit log; one lock guards both.
#[derive(Debug)]
struct AuthState {
    /// Live challenges by nonce
    active: HashMap<String, ProofChallenge>,
    /// Issuance and verification attempts per source
    attempts: RateLimiter,
}

/// Issues challenges, produces proofs, and verifies them.
///
/// Holds a secret key derived from a credential with Argon2id under a salt
/// unique to this instance, and publishes `commitment = H(secret_key)`.
pub struct ChallengeAuthenticator {
    /// Configuration
    config: AuthenticatorConfig,
    /// Derived key (zeroized on drop)
    secret_key: SecretKey,
    /// Salt the key was derived with
    salt: Vec<u8>,
    /// Public commitment to the key
    commitment: String,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Mutable protocol state
    state: Mutex<AuthState>,
}

impl ChallengeAuthenticator {
    /// Derive a key from `credential` under a fresh random salt.
    pub fn new(credential: &str, config: AuthenticatorConfig) -> Result<Self> {
        let salt = crypto::generate_salt();
        Self::with_salt(credential, &salt, config)
    }

    /// Derive a key under a caller-supplied salt.
    ///
    /// A prover and a verifier that share the credential and the salt derive
    /// the same key and commitment.
    pub fn with_salt(credential: &str, salt: &[u8], config: AuthenticatorConfig) -> Result<Self> {
        let secret_key = crypto::derive_secret_key(credential.as_bytes(), salt, &config.kdf)?;
        let commitment = crypto::commitment(secret_key.as_slice());

        let state = AuthState {
            active: HashMap::new(),
            attempts: RateLimiter::new(config.attempt_window(), config.max_attempts),
        };

        debug!(commitment = %commitment, "Derived authenticator key");

        Ok(Self {
            config,
            secret_key,
            salt: salt.to_vec(),
            commitment,
            clock: Arc::new(SystemClock),
            state: Mutex::new(state),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Public commitment to the secret key.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Salt the secret key was derived with.
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// Configuration in use.
    pub fn config(&self) -> &AuthenticatorConfig {
        &self.config
    }

    /// Issue a fresh challenge to a source.
    pub fn generate_challenge(&self, source_id: &str) -> Result<ProofChallenge> {
        let now = self.clock.now();
        let mut state = self.state();

        if !state.attempts.check_and_record(source_id, now) {
            warn!(target: "audit", source_id = %source_id, "Rate limit exceeded for challenge");
            return Err(self.rate_limited(source_id));
        }

        let challenge = ProofChallenge {
            challenge_number: crypto::generate_challenge_number(),
            nonce: crypto::generate_nonce(),
            issued_at: now,
            expires_at: saturating_add(now, self.config.challenge_timeout()),
        };
        state.active.insert(challenge.nonce.clone(), challenge.clone());

        info!(
            target: "audit",
            source_id = %source_id,
            expires_at = %challenge.expires_at,
            "Challenge generated"
        );

        Ok(challenge)
    }

    /// Answer a challenge with this authenticator's key (prover side).
    pub fn generate_proof(&self, challenge: &ProofChallenge) -> Result<ProofResponse> {
        let now = self.clock.now();
        if challenge.is_expired_at(now) {
            return Err(AuthError::ChallengeExpired);
        }

        let proof_hash = crypto::proof_hash(
            self.secret_key.as_slice(),
            challenge.challenge_number,
            &challenge.nonce,
        );

        debug!("Generated proof for challenge");
        Ok(ProofResponse {
            proof_hash,
            nonce: challenge.nonce.clone(),
            timestamp: now,
        })
    }

    /// Verify a proof against an outstanding challenge.
    ///
    /// Checks, in order: rate limit, that the nonce is outstanding and its
    /// stored challenge equals `challenge`, expiry, proof timestamp skew, the
    /// claimed commitment, and the proof hash. Only full success consumes the
    /// nonce. Expired challenges are swept before returning either way; a
    /// swept challenge presented again still reports `ChallengeExpired`.
    ///
    /// Verification attempts share the per-source log with issuance.
    pub fn verify_proof(
        &self,
        proof: &ProofResponse,
        challenge: &ProofChallenge,
        claimed_commitment: &str,
        source_id: &str,
    ) -> Result<bool> {
        let now = self.clock.now();
        let mut state = self.state();

        let result = self.check_proof(&mut state, proof, challenge, claimed_commitment, source_id, now);
        Self::sweep_locked(&mut state, now);
        drop(state);

        match &result {
            Ok(_) => info!(target: "audit", source_id = %source_id, "Successful verification"),
            Err(e) => warn!(
                target: "audit",
                source_id = %source_id,
                reason = e.kind(),
                "Verification failed: {e}"
            ),
        }

        result
    }

    fn check_proof(
        &self,
        state: &mut AuthState,
        proof: &ProofResponse,
        challenge: &ProofChallenge,
        claimed_commitment: &str,
        source_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if !state.attempts.check_and_record(source_id, now) {
            return Err(self.rate_limited(source_id));
        }

        match state.active.get(&proof.nonce) {
            Some(stored) if stored == challenge => {}
            // Already swept: report staleness rather than an unknown nonce
            None if challenge.nonce == proof.nonce && challenge.is_expired_at(now) => {
                return Err(AuthError::ChallengeExpired);
            }
            _ => return Err(AuthError::InvalidChallenge),
        }

        if challenge.is_expired_at(now) {
            return Err(AuthError::ChallengeExpired);
        }

        let skew_ms = proof.timestamp.signed_duration_since(now).num_milliseconds();
        if skew_ms.abs() > self.config.max_clock_skew().num_milliseconds() {
            return Err(AuthError::TimestampOutOfRange { skew_ms });
        }

        if !crypto::constant_time_eq(claimed_commitment, &self.commitment) {
            return Err(AuthError::CommitmentMismatch);
        }

        let expected = crypto::proof_hash(
            self.secret_key.as_slice(),
            challenge.challenge_number,
            &challenge.nonce,
        );
        if !crypto::constant_time_eq(&proof.proof_hash, &expected) {
            return Err(AuthError::InvalidProof);
        }

        state.active.remove(&proof.nonce);
        Ok(true)
    }

    /// Delete every challenge past its expiry, presented or not.
    ///
    /// Returns the number of challenges removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state();
        Self::sweep_locked(&mut state, now)
    }

    fn sweep_locked(state: &mut AuthState, now: DateTime<Utc>) -> usize {
        let before = state.active.len();
        state.active.retain(|_, challenge| !challenge.is_expired_at(now));
        state.attempts.cleanup(now);
        before - state.active.len()
    }

    /// Number of challenges still awaiting verification.
    pub fn outstanding_challenges(&self) -> usize {
        self.state().active.len()
    }

    fn rate_limited(&self, source_id: &str) -> AuthError {
        AuthError::RateLimitExceeded {
            source_id: source_id.to_string(),
            max_attempts: self.config.max_attempts,
            window_secs: self.config.attempt_window_secs,
        }
    }
}

impl std::fmt::Debug for ChallengeAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeAuthenticator")
            .field("commitment", &self.commitment)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::KdfConfig;
    use chrono::Duration;

    fn fast_config() -> AuthenticatorConfig {
        AuthenticatorConfig {
            kdf: KdfConfig::insecure_fast(),
            ..Default::default()
        }
    }

    fn authenticator(credential: &str) -> (ChallengeAuthenticator, ManualClock) {
        authenticator_with(credential, fast_config())
    }

    fn authenticator_with(
        credential: &str,
        config: AuthenticatorConfig,
    ) -> (ChallengeAuthenticator, ManualClock) {
        let clock = ManualClock::starting_now();
        let auth = ChallengeAuthenticator::new(credential, config)
            .unwrap()
            .with_clock(Arc::new(clock.clone()));
        (auth, clock)
    }

    #[test]
    fn test_successful_verification_consumes_nonce() {
        let (auth, _clock) = authenticator("secret_password_123");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();
        let commitment = auth.commitment().to_string();

        assert_eq!(auth.verify_proof(&proof, &challenge, &commitment, "ip1"), Ok(true));
        assert_eq!(auth.outstanding_challenges(), 0);

        // Replay of the same proof
        assert_eq!(
            auth.verify_proof(&proof, &challenge, &commitment, "ip1"),
            Err(AuthError::InvalidChallenge)
        );

        // Replay with a field-identical copy of the challenge
        let copy = ProofChallenge { ..challenge.clone() };
        assert_eq!(
            auth.verify_proof(&proof, &copy, &commitment, "ip1"),
            Err(AuthError::InvalidChallenge)
        );
    }

    #[test]
    fn test_forged_challenge_rejected_without_consuming() {
        let (auth, _clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();
        let commitment = auth.commitment().to_string();

        let forged = ProofChallenge {
            challenge_number: challenge.challenge_number % crypto::MAX_CHALLENGE_NUMBER + 1,
            ..challenge.clone()
        };
        assert_eq!(
            auth.verify_proof(&proof, &forged, &commitment, "ip1"),
            Err(AuthError::InvalidChallenge)
        );

        assert_eq!(auth.outstanding_challenges(), 1);
        assert_eq!(auth.verify_proof(&proof, &challenge, &commitment, "ip1"), Ok(true));
    }

    #[test]
    fn test_expired_challenge_fails_even_with_correct_proof() {
        let (auth, clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();
        let commitment = auth.commitment().to_string();

        clock.advance(Duration::seconds(31));
        assert_eq!(
            auth.verify_proof(&proof, &challenge, &commitment, "ip1"),
            Err(AuthError::ChallengeExpired)
        );

        // The sweep after verification removed it
        assert_eq!(auth.outstanding_challenges(), 0);
    }

    #[test]
    fn test_generate_proof_rejects_expired_challenge() {
        let (auth, clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        clock.advance(Duration::seconds(30));
        assert!(auth.generate_proof(&challenge).is_ok());

        clock.advance(Duration::milliseconds(1));
        assert_eq!(auth.generate_proof(&challenge), Err(AuthError::ChallengeExpired));
    }

    #[test]
    fn test_stale_proof_timestamp() {
        let (auth, clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();
        let commitment = auth.commitment().to_string();

        clock.advance(Duration::seconds(6));
        assert!(matches!(
            auth.verify_proof(&proof, &challenge, &commitment, "ip1"),
            Err(AuthError::TimestampOutOfRange { .. })
        ));

        // Not consumed: a fresh proof for the same challenge still verifies
        let fresh = auth.generate_proof(&challenge).unwrap();
        assert_eq!(auth.verify_proof(&fresh, &challenge, &commitment, "ip1"), Ok(true));
    }

    #[test]
    fn test_commitment_mismatch() {
        let (auth, _clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();

        assert_eq!(
            auth.verify_proof(&proof, &challenge, "not-our-commitment", "ip1"),
            Err(AuthError::CommitmentMismatch)
        );
        assert_eq!(auth.outstanding_challenges(), 1);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (verifier, _clock) = authenticator("verifier_secret");
        let (impostor, _other_clock) = authenticator("impostor_secret");

        let challenge = verifier.generate_challenge("ip1").unwrap();
        let forged = impostor.generate_proof(&challenge).unwrap();

        assert_eq!(
            verifier.verify_proof(&forged, &challenge, impostor.commitment(), "ip1"),
            Err(AuthError::CommitmentMismatch)
        );
        assert_eq!(
            verifier.verify_proof(&forged, &challenge, verifier.commitment(), "ip1"),
            Err(AuthError::InvalidProof)
        );
    }

    #[test]
    fn test_shared_salt_lets_prover_and_verifier_agree() {
        let verifier = ChallengeAuthenticator::new("shared_secret", fast_config()).unwrap();
        let prover =
            ChallengeAuthenticator::with_salt("shared_secret", verifier.salt(), fast_config()).unwrap();
        assert_eq!(prover.commitment(), verifier.commitment());

        let challenge = verifier.generate_challenge("ip1").unwrap();
        let proof = prover.generate_proof(&challenge).unwrap();
        assert_eq!(
            verifier.verify_proof(&proof, &challenge, prover.commitment(), "ip1"),
            Ok(true)
        );
    }

    #[test]
    fn test_random_salt_per_instance() {
        let a = ChallengeAuthenticator::new("same", fast_config()).unwrap();
        let b = ChallengeAuthenticator::new("same", fast_config()).unwrap();
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn test_challenge_rate_limit() {
        let (auth, clock) = authenticator("secret");
        for _ in 0..5 {
            auth.generate_challenge("ip1").unwrap();
        }

        let err = auth.generate_challenge("ip1").unwrap_err();
        assert!(err.is_rate_limited());

        // Other sources are unaffected
        assert!(auth.generate_challenge("ip2").is_ok());

        // Window slides
        clock.advance(Duration::seconds(301));
        assert!(auth.generate_challenge("ip1").is_ok());
    }

    #[test]
    fn test_issuance_and_verification_share_rate_limit() {
        let config = AuthenticatorConfig {
            max_attempts: 2,
            ..fast_config()
        };
        let (auth, clock) = authenticator_with("secret", config);
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();
        assert_eq!(
            auth.verify_proof(&proof, &challenge, auth.commitment(), "ip1"),
            Ok(true)
        );

        // One issuance plus one verification used up the window
        assert!(auth.generate_challenge("ip1").unwrap_err().is_rate_limited());

        // Other sources have their own log
        let other = auth.generate_challenge("ip2").unwrap();
        let proof = auth.generate_proof(&other).unwrap();
        assert!(auth
            .verify_proof(&proof, &other, "wrong", "ip2")
            .is_err());
        let err = auth
            .verify_proof(&proof, &other, auth.commitment(), "ip2")
            .unwrap_err();
        assert!(err.is_rate_limited());

        clock.advance(Duration::seconds(301));
        assert!(auth.generate_challenge("ip1").is_ok());
    }

    #[test]
    fn test_swept_challenge_still_reports_expired() {
        let (auth, clock) = authenticator("secret");
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();

        clock.advance(Duration::seconds(31));
        assert_eq!(auth.sweep_expired(), 1);

        for _ in 0..2 {
            assert_eq!(
                auth.verify_proof(&proof, &challenge, auth.commitment(), "ip1"),
                Err(AuthError::ChallengeExpired)
            );
        }
    }

    #[test]
    fn test_oversized_durations_do_not_panic() {
        let config = AuthenticatorConfig {
            attempt_window_secs: 100_000_000_000_000,
            challenge_timeout_secs: u64::MAX,
            ..fast_config()
        };
        let (auth, _clock) = authenticator_with("secret", config);

        let challenge = auth.generate_challenge("ip1").unwrap();
        assert_eq!(challenge.expires_at, DateTime::<Utc>::MAX_UTC);

        let proof = auth.generate_proof(&challenge).unwrap();
        assert_eq!(
            auth.verify_proof(&proof, &challenge, auth.commitment(), "ip1"),
            Ok(true)
        );
        assert_eq!(auth.sweep_expired(), 0);
    }

    #[test]
    fn test_sweep_removes_unpresented_challenges() {
        let (auth, clock) = authenticator("secret");
        auth.generate_challenge("ip1").unwrap();
        auth.generate_challenge("ip2").unwrap();
        clock.advance(Duration::seconds(10));
        auth.generate_challenge("ip3").unwrap();

        clock.advance(Duration::seconds(25));
        assert_eq!(auth.sweep_expired(), 2);
        assert_eq!(auth.outstanding_challenges(), 1);
    }

    #[test]
    fn test_concurrent_verification_succeeds_once() {
        let config = AuthenticatorConfig {
            max_attempts: 100,
            ..fast_config()
        };
        let (auth, _clock) = authenticator_with("secret", config);
        let auth = Arc::new(auth);
        let challenge = auth.generate_challenge("ip1").unwrap();
        let proof = auth.generate_proof(&challenge).unwrap();

        let successes = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let auth = Arc::clone(&auth);
                    let challenge = &challenge;
                    let proof = &proof;
                    scope.spawn(move || {
                        auth.verify_proof(proof, challenge, auth.commitment(), "ip1")
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|&ok| ok)
                .count()
        });

        assert_eq!(successes, 1);
    }

    #[test]
    fn test_debug_hides_secret() {
        let (auth, _clock) = authenticator("secret");
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("commitment"));
        assert!(!rendered.contains("secret_key"));
    }
}
