//! Gatekeeper - spatial and cryptographic access control for CFIR entities
//!
//! Decides whether a request may touch data at a location by joining three
//! independent concerns:
//!
//! 1. **Space**: is the location inside the entity's [`horizon`], and does a
//!    receptor of the right type cover it?
//! 2. **Proof**: does the caller hold the secret behind the entity's
//!    commitment ([`proof_auth`])?
//! 3. **Behavior**: does recent activity look anomalous? Reported to the
//!    [`IntrusionMonitor`], which raises alerts but never blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────── ProtectedEntity ─────────────────────────┐
//! │                                                                  │
//! │   AccessRequest ──► AccessGate ──┬──► SpatialHorizon             │
//! │                        │         └──► ChallengeAuthenticator     │
//! │                        ▼                                         │
//! │                 IntrusionMonitor ──► AnomalyAlert                │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gatekeeper::{GateConfig, ProtectedEntity};
//! use horizon::SphericalCoordinate;
//! use proof_auth::KdfConfig;
//! use std::f64::consts::FRAC_PI_2;
//!
//! let mut config = GateConfig::new("sensor-1");
//! config.auth.kdf = KdfConfig::insecure_fast();
//!
//! let entity = ProtectedEntity::new(SphericalCoordinate::origin(), "secret", config).unwrap();
//! let placement = SphericalCoordinate::new(5.0, FRAC_PI_2, 0.0).unwrap();
//! entity.add_receptor(placement, 5.0, "temperature").unwrap();
//!
//! let near = SphericalCoordinate::new(7.0, FRAC_PI_2, 0.0).unwrap();
//! let far = SphericalCoordinate::new(15.0, FRAC_PI_2, 0.0).unwrap();
//! assert!(entity.can_access_data(&near, Some("temperature"), None, None));
//! assert!(!entity.can_access_data(&far, None, None, None));
//! ```

pub mod anomaly;
pub mod config;
pub mod entity;
pub mod error;
pub mod gate;
pub mod registry;

// Re-export main types
pub use anomaly::{AccessPattern, AlertSeverity, AnomalyAlert, AnomalyKind, IntrusionMonitor, MonitorStats};
pub use config::{GateConfig, GeneralConfig, MonitorConfig};
pub use entity::{ProtectedEntity, SweepReport};
pub use error::{GateError, Result};
pub use gate::{AccessDecision, AccessGate, AccessRequest, DenialReason, UNTYPED_ACCESS};
pub use registry::EntityRegistry;
