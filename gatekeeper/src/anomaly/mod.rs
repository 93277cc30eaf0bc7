//! Intrusion monitoring.
//!
//! Behavioral signals that never block a request on their own:
//! - **Access frequency**: accesses inside a sliding window
//! - **Failures**: cumulative failed accesses and failed syncs
//! - **Spatial violations**: reported by callers enforcing stricter policy
//!
//! Crossing a threshold raises an [`AnomalyAlert`] that operators resolve.

mod monitor;
mod pattern;

pub use monitor::{IntrusionMonitor, MonitorStats};
pub use pattern::AccessPattern;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of behavior raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    AccessFrequency,
    SpatialViolation,
    AuthFailure,
    SyncFailure,
    DataPattern,
}

impl AnomalyKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::AccessFrequency => "access_frequency",
            AnomalyKind::SpatialViolation => "spatial_violation",
            AnomalyKind::AuthFailure => "authentication_failure",
            AnomalyKind::SyncFailure => "synchronization_failure",
            AnomalyKind::DataPattern => "data_pattern",
        }
    }
}

/// Severity of an alert. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Low severity - worth noting
    Low,
    /// Medium severity - requires attention
    Medium,
    /// High severity - immediate action needed
    High,
    /// Critical - likely attack in progress
    Critical,
}

impl AlertSeverity {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// An alert raised when a monitored signal crosses its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlert {
    /// `{entity_id}_alert_{n}`, n counting from 1
    pub id: String,
    /// Entity the alert belongs to
    pub entity_id: String,
    /// Signal that fired
    pub kind: AnomalyKind,
    /// Severity
    pub severity: AlertSeverity,
    /// When it was raised
    pub created_at: DateTime<Utc>,
    /// Signal-specific payload
    pub details: HashMap<String, serde_json::Value>,
    /// Whether an operator has resolved it
    pub resolved: bool,
    /// Set once resolved
    pub resolved_at: Option<DateTime<Utc>>,
    /// Set once resolved
    pub resolution_note: Option<String>,
}

impl AnomalyAlert {
    /// Whether the alert is unresolved and at least `min_severity`.
    pub fn is_active_at_least(&self, min_severity: AlertSeverity) -> bool {
        !self.resolved && self.severity >= min_severity
    }
}
