//! ProtectedEntity - one entity's horizon, authenticator and monitor.
//!
//! An entity holds its components rather than inheriting behavior from
//! several entity kinds; the [`AccessGate`] is the only place they meet.

use horizon::{SpatialHorizon, SphericalCoordinate};
use proof_auth::{ChallengeAuthenticator, Clock, ProofChallenge, ProofResponse, SystemClock};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::anomaly::{AlertSeverity, AnomalyAlert, IntrusionMonitor};
use crate::config::GateConfig;
use crate::error::Result;
use crate::gate::{AccessDecision, AccessGate, AccessRequest};

/// What one maintenance pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired challenges dropped
    pub challenges: usize,
    /// Resolved alerts past retention dropped
    pub alerts: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.challenges + self.alerts
    }
}

impl std::ops::AddAssign for SweepReport {
    fn add_assign(&mut self, other: Self) {
        self.challenges += other.challenges;
        self.alerts += other.alerts;
    }
}

/// An entity protected by spatial, cryptographic and behavioral checks.
#[derive(Debug)]
pub struct ProtectedEntity {
    /// Configuration
    config: GateConfig,
    /// Sensing envelope
    horizon: Arc<SpatialHorizon>,
    /// Challenge/response authenticator
    authenticator: Arc<ChallengeAuthenticator>,
    /// Intrusion monitor
    monitor: Arc<IntrusionMonitor>,
    /// Gate over the three above
    gate: AccessGate,
}

impl ProtectedEntity {
    /// Create an entity centred at `center`, deriving its key from `credential`.
    pub fn new(center: SphericalCoordinate, credential: &str, config: GateConfig) -> Result<Self> {
        Self::with_clock(center, credential, config, Arc::new(SystemClock))
    }

    /// Create with a custom time source shared by the authenticator and monitor.
    pub fn with_clock(
        center: SphericalCoordinate,
        credential: &str,
        config: GateConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let horizon = Arc::new(SpatialHorizon::new(center));
        let authenticator = Arc::new(
            ChallengeAuthenticator::new(credential, config.auth.clone())?.with_clock(Arc::clone(&clock)),
        );
        let monitor = Arc::new(
            IntrusionMonitor::new(config.entity_id.clone(), config.monitor.clone()).with_clock(clock),
        );
        let gate = AccessGate::new(
            Arc::clone(&horizon),
            Arc::clone(&authenticator),
            Arc::clone(&monitor),
        )
        .with_general(config.general.clone());

        info!(
            entity_id = %config.entity_id,
            center = %center,
            commitment = %authenticator.commitment(),
            "Created protected entity"
        );

        Ok(Self {
            config,
            horizon,
            authenticator,
            monitor,
            gate,
        })
    }

    /// Get entity ID.
    pub fn id(&self) -> &str {
        &self.config.entity_id
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn horizon(&self) -> &Arc<SpatialHorizon> {
        &self.horizon
    }

    pub fn authenticator(&self) -> &Arc<ChallengeAuthenticator> {
        &self.authenticator
    }

    pub fn monitor(&self) -> &Arc<IntrusionMonitor> {
        &self.monitor
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Attach a receptor. Malformed receptors are configuration errors and
    /// propagate to the caller.
    pub fn add_receptor(
        &self,
        coordinates: SphericalCoordinate,
        detection_radius: f64,
        data_type: &str,
    ) -> Result<()> {
        self.horizon
            .add_receptor(coordinates, detection_radius, data_type)?;
        Ok(())
    }

    /// Issue a challenge to a source.
    pub fn issue_challenge(&self, source_id: &str) -> Result<ProofChallenge> {
        Ok(self.authenticator.generate_challenge(source_id)?)
    }

    /// Answer a challenge with this entity's own key.
    pub fn prove_identity(&self, challenge: &ProofChallenge) -> Result<ProofResponse> {
        Ok(self.authenticator.generate_proof(challenge)?)
    }

    /// Commitment other parties verify proofs against.
    pub fn public_commitment(&self) -> &str {
        self.authenticator.commitment()
    }

    /// Whether data at `location` may be accessed.
    pub fn can_access_data(
        &self,
        location: &SphericalCoordinate,
        data_type: Option<&str>,
        proof: Option<&ProofResponse>,
        challenge: Option<&ProofChallenge>,
    ) -> bool {
        self.gate.can_access(location, data_type, proof, challenge)
    }

    /// Full access decision with the denial reason.
    pub fn evaluate(&self, request: &AccessRequest<'_>) -> AccessDecision {
        self.gate.evaluate(request)
    }

    /// Unresolved alerts at or above `min_severity`.
    pub fn active_alerts(&self, min_severity: AlertSeverity) -> Vec<AnomalyAlert> {
        self.monitor.active_alerts(min_severity)
    }

    /// Drop expired challenges and stale resolved alerts.
    pub fn sweep_expired(&self) -> SweepReport {
        SweepReport {
            challenges: self.authenticator.sweep_expired(),
            alerts: self.monitor.sweep_expired(),
        }
    }
}
