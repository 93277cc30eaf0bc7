//! Access gate: joins spatial, cryptographic and behavioral checks.

use horizon::{SpatialHorizon, SphericalCoordinate};
use proof_auth::{AuthError, ChallengeAuthenticator, ProofChallenge, ProofResponse};
use std::sync::Arc;
use tracing::{info, warn};

use crate::anomaly::IntrusionMonitor;
use crate::config::GeneralConfig;

/// Access type reported to the monitor when a request names no data type.
pub const UNTYPED_ACCESS: &str = "any";

/// A request to read or write data at a location.
#[derive(Debug, Clone, Copy)]
pub struct AccessRequest<'a> {
    /// Where the data lives
    pub location: SphericalCoordinate,
    /// Receptor type that must cover the location
    pub data_type: Option<&'a str>,
    /// Proof to verify; only checked together with `challenge`
    pub proof: Option<&'a ProofResponse>,
    /// Challenge the proof answers
    pub challenge: Option<&'a ProofChallenge>,
    /// Commitment the prover claims; defaults to the authenticator's own
    pub claimed_commitment: Option<&'a str>,
    /// Rate-limit source; defaults to the configured source
    pub source_id: Option<&'a str>,
}

impl<'a> AccessRequest<'a> {
    /// Request with only a location.
    pub fn new(location: SphericalCoordinate) -> Self {
        Self {
            location,
            data_type: None,
            proof: None,
            challenge: None,
            claimed_commitment: None,
            source_id: None,
        }
    }

    pub fn with_data_type(mut self, data_type: &'a str) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_proof(mut self, proof: &'a ProofResponse, challenge: &'a ProofChallenge) -> Self {
        self.proof = Some(proof);
        self.challenge = Some(challenge);
        self
    }

    pub fn with_commitment(mut self, commitment: &'a str) -> Self {
        self.claimed_commitment = Some(commitment);
        self
    }

    pub fn from_source(mut self, source_id: &'a str) -> Self {
        self.source_id = Some(source_id);
        self
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum DenialReason {
    /// Location is beyond the horizon's outer radius
    OutsideHorizon { distance: f64, max_radius: f64 },
    /// No receptor of the requested type can see the location
    NoReceptor { data_type: String },
    /// Proof verification failed
    ProofRejected(AuthError),
}

impl DenialReason {
    /// Short machine-readable label for audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::OutsideHorizon { .. } => "outside_horizon",
            DenialReason::NoReceptor { .. } => "no_receptor",
            DenialReason::ProofRejected(_) => "proof_rejected",
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Granted,
    Denied(DenialReason),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }

    /// Denial reason, if any.
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            AccessDecision::Granted => None,
            AccessDecision::Denied(reason) => Some(reason),
        }
    }
}

/// Decides whether a request may proceed for one protected entity.
///
/// Checks run in order and stop at the first failure:
/// 1. the location is inside the horizon
/// 2. a receptor of the requested type covers it (when a type is given)
/// 3. the proof verifies (when both proof and challenge are given)
///
/// Every evaluation is reported to the monitor as one access event, whatever
/// its outcome. Monitor alerts never change the decision.
#[derive(Debug, Clone)]
pub struct AccessGate {
    horizon: Arc<SpatialHorizon>,
    authenticator: Arc<ChallengeAuthenticator>,
    monitor: Arc<IntrusionMonitor>,
    general: GeneralConfig,
}

impl AccessGate {
    pub fn new(
        horizon: Arc<SpatialHorizon>,
        authenticator: Arc<ChallengeAuthenticator>,
        monitor: Arc<IntrusionMonitor>,
    ) -> Self {
        Self {
            horizon,
            authenticator,
            monitor,
            general: GeneralConfig::default(),
        }
    }

    /// Use custom general settings.
    pub fn with_general(mut self, general: GeneralConfig) -> Self {
        self.general = general;
        self
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

    /// Boolean form of [`AccessGate::evaluate`].
    pub fn can_access(
        &self,
        location: &SphericalCoordinate,
        data_type: Option<&str>,
        proof: Option<&ProofResponse>,
        challenge: Option<&ProofChallenge>,
    ) -> bool {
        let request = AccessRequest {
            location: *location,
            data_type,
            proof,
            challenge,
            claimed_commitment: None,
            source_id: None,
        };
        self.evaluate(&request).is_granted()
    }

    /// Evaluate a request and report it to the monitor.
    pub fn evaluate(&self, request: &AccessRequest<'_>) -> AccessDecision {
        let decision = self.decide(request);
        let access_type = request.data_type.unwrap_or(UNTYPED_ACCESS);

        if self.general.audit_enabled {
            match &decision {
                AccessDecision::Granted => info!(
                    target: "audit",
                    entity_id = %self.monitor.entity_id(),
                    location = %request.location,
                    access_type = %access_type,
                    "Access granted"
                ),
                AccessDecision::Denied(reason) => warn!(
                    target: "audit",
                    entity_id = %self.monitor.entity_id(),
                    location = %request.location,
                    access_type = %access_type,
                    reason = reason.as_str(),
                    "Access denied: {reason:?}"
                ),
            }
        }

        self.monitor.monitor_access(access_type, decision.is_granted());
        decision
    }

    fn decide(&self, request: &AccessRequest<'_>) -> AccessDecision {
        if !self.horizon.contains_point(&request.location) {
            return AccessDecision::Denied(DenialReason::OutsideHorizon {
                distance: self.horizon.center().distance_to(&request.location),
                max_radius: self.horizon.max_radius(),
            });
        }

        if let Some(data_type) = request.data_type {
            if self
                .horizon
                .nearby_receptors(&request.location, Some(data_type))
                .is_empty()
            {
                return AccessDecision::Denied(DenialReason::NoReceptor {
                    data_type: data_type.to_string(),
                });
            }
        }

        if let (Some(proof), Some(challenge)) = (request.proof, request.challenge) {
            let commitment = request
                .claimed_commitment
                .unwrap_or_else(|| self.authenticator.commitment());
            let source_id = request
                .source_id
                .unwrap_or(self.general.default_source.as_str());

            let rejected = match self
                .authenticator
                .verify_proof(proof, challenge, commitment, source_id)
            {
                Ok(true) => None,
                Ok(false) => Some(AuthError::InvalidProof),
                Err(e) => Some(e),
            };
            if let Some(e) = rejected {
                return AccessDecision::Denied(DenialReason::ProofRejected(e));
            }
        }

        AccessDecision::Granted
    }
}
