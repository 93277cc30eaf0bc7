//! Cryptographic primitives for the proof protocol.
//!
//! # Algorithms
//!
//! - **Key Derivation**: Argon2id with a per-authenticator random salt
//! - **Commitment / proof hashing**: SHA-256, hex encoded
//! - **Nonces**: 32 bytes from the OS RNG, URL-safe base64
//!
//! These give a commitment-based proof of knowledge, not a formally
//! zero-knowledge scheme.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::config::KdfConfig;
use crate::error::{AuthError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Salt length for key derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Derived secret key length (32 bytes)
pub const SECRET_KEY_LEN: usize = 32;

/// Raw nonce length before encoding (32 bytes)
pub const NONCE_LEN: usize = 32;

/// Largest challenge number handed out
pub const MAX_CHALLENGE_NUMBER: u64 = 1_000_000_000;

/// Derived secret key; cleared from memory on drop.
pub type SecretKey = Zeroizing<[u8; SECRET_KEY_LEN]>;

// =============================================================================
// Key Derivation
// =============================================================================

/// Derive the authenticator's secret key from a credential.
///
/// Deliberately expensive. The salt must be unique per authenticator;
/// Argon2 requires at least 8 bytes.
pub fn derive_secret_key(credential: &[u8], salt: &[u8], kdf: &KdfConfig) -> Result<SecretKey> {
    let params = Params::new(
        kdf.memory_kib,
        kdf.iterations,
        kdf.parallelism,
        Some(SECRET_KEY_LEN),
    )
    .map_err(|e| AuthError::KeyDerivation(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; SECRET_KEY_LEN]);
    argon2
        .hash_password_into(credential, salt, &mut key[..])
        .map_err(|e| AuthError::KeyDerivation(e.to_string()))?;

    Ok(key)
}

// =============================================================================
// Hashing
// =============================================================================

/// SHA-256 over the concatenation of all parts, hex encoded.
pub fn hash_parts(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Public commitment to a secret key.
pub fn commitment(secret_key: &[u8]) -> String {
    hash_parts(&[secret_key])
}

/// Proof hash binding a secret key to one challenge.
pub fn proof_hash(secret_key: &[u8], challenge_number: u64, nonce: &str) -> String {
    hash_parts(&[
        secret_key,
        challenge_number.to_string().as_bytes(),
        nonce.as_bytes(),
    ])
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

// =============================================================================
// Randomness
// =============================================================================

/// Fresh random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Unguessable single-use nonce.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Positive random challenge number.
pub fn generate_challenge_number() -> u64 {
    OsRng.gen_range(1..=MAX_CHALLENGE_NUMBER)
}
