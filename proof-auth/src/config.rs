//! Configuration for the challenge authenticator.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Authenticator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatorConfig {
    /// Maximum attempts per source inside the window (applied separately to
    /// challenge issuance and to verification)
    pub max_attempts: usize,
    /// Rate-limit window (seconds)
    pub attempt_window_secs: u64,
    /// Challenge lifetime (seconds)
    pub challenge_timeout_secs: u64,
    /// Allowed distance between a proof's timestamp and verifier time (seconds)
    pub max_clock_skew_secs: u64,
    /// Key derivation cost
    pub kdf: KdfConfig,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window_secs: 300, // 5 minutes
            challenge_timeout_secs: 30,
            max_clock_skew_secs: 5,
            kdf: KdfConfig::default(),
        }
    }
}

impl AuthenticatorConfig {
    /// Rate-limit window as a duration.
    pub fn attempt_window(&self) -> Duration {
        Duration::seconds(saturating_secs(self.attempt_window_secs))
    }

    /// Challenge lifetime as a duration.
    pub fn challenge_timeout(&self) -> Duration {
        Duration::seconds(saturating_secs(self.challenge_timeout_secs))
    }

    /// Clock-skew tolerance as a duration.
    pub fn max_clock_skew(&self) -> Duration {
        Duration::seconds(saturating_secs(self.max_clock_skew_secs))
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Iteration count
    pub iterations: u32,
    /// Parallelism (lanes)
    pub parallelism: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl KdfConfig {
    /// Smallest parameters Argon2 accepts. Only for tests and simulations.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

fn saturating_secs(secs: u64) -> i64 {
    // chrono rejects durations beyond ~i64::MAX milliseconds
    i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000)
}
