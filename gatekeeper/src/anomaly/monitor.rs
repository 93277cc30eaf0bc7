//! Per-entity intrusion monitor.

use chrono::{DateTime, Utc};
use horizon::SphericalCoordinate;
use proof_auth::clock::saturating_sub;
use proof_auth::{Clock, SystemClock};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::pattern::AccessPattern;
use super::{AlertSeverity, AnomalyAlert, AnomalyKind};
use crate::config::MonitorConfig;

/// Window, counters and alerts for one entity; one lock guards all of it.
#[derive(Debug)]
struct MonitorState {
    pattern: AccessPattern,
    auth_failures: u64,
    sync_failures: u64,
    spatial_violations: u64,
    alerts: Vec<AnomalyAlert>,
    /// Last alert number handed out
    alert_count: u64,
}

/// Snapshot of a monitor's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorStats {
    /// Accesses inside the current window
    pub accesses_in_window: usize,
    /// Lifetime accesses per type
    pub access_types: HashMap<String, u64>,
    pub auth_failures: u64,
    pub sync_failures: u64,
    pub spatial_violations: u64,
    /// Alerts retained (resolved or not)
    pub total_alerts: usize,
    /// Unresolved alerts
    pub active_alerts: usize,
}

/// Tracks one entity's access behavior and raises alerts on thresholds.
///
/// Advisory only: nothing here fails or blocks the caller.
pub struct IntrusionMonitor {
    entity_id: String,
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<MonitorState>,
}

impl IntrusionMonitor {
    /// Create a monitor for an entity.
    pub fn new(entity_id: impl Into<String>, config: MonitorConfig) -> Self {
        let state = MonitorState {
            pattern: AccessPattern::new(config.window()),
            auth_failures: 0,
            sync_failures: 0,
            spatial_violations: 0,
            alerts: Vec::new(),
            alert_count: 0,
        };

        Self {
            entity_id: entity_id.into(),
            config,
            clock: Arc::new(SystemClock),
            state: Mutex::new(state),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn state(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Entity being monitored.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Configuration in use.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Record an access without evaluating thresholds.
    ///
    /// `at` defaults to the current time; a time earlier than the newest
    /// recorded access is clamped up to it.
    pub fn record_access(&self, access_type: &str, at: Option<DateTime<Utc>>) {
        let at = at.unwrap_or_else(|| self.clock.now());
        self.state().pattern.record(access_type, at);
    }

    /// Record an access and check the frequency and failure signals.
    ///
    /// Frequency is measured per configured window: more than
    /// `max_frequency` accesses inside it raises a High `AccessFrequency`
    /// alert. A failed access bumps the cumulative failure counter, and every
    /// failure at or past `auth_failure_threshold` raises a Critical
    /// `AuthFailure` alert. When both fire, both are recorded and the
    /// frequency alert is returned.
    pub fn monitor_access(&self, access_type: &str, success: bool) -> Option<AnomalyAlert> {
        let now = self.clock.now();
        let mut state = self.state();

        state.pattern.record(access_type, now);
        let count = state.pattern.count_in_window(now);

        debug!(
            entity_id = %self.entity_id,
            access_type = %access_type,
            success = success,
            accesses_in_window = count,
            "Access recorded"
        );

        let mut raised = Vec::new();

        if count > self.config.max_frequency {
            let span_secs = state.pattern.span(now).num_milliseconds() as f64 / 1000.0;
            raised.push(self.push_alert(
                &mut state,
                now,
                AnomalyKind::AccessFrequency,
                AlertSeverity::High,
                HashMap::from([
                    ("frequency".to_string(), json!(count)),
                    ("threshold".to_string(), json!(self.config.max_frequency)),
                    ("window_secs".to_string(), json!(self.config.window_secs)),
                    ("span_secs".to_string(), json!(span_secs)),
                    ("access_type".to_string(), json!(access_type)),
                ]),
            ));
        }

        if !success {
            state.auth_failures += 1;
            if state.auth_failures >= self.config.auth_failure_threshold {
                let failure_count = state.auth_failures;
                raised.push(self.push_alert(
                    &mut state,
                    now,
                    AnomalyKind::AuthFailure,
                    AlertSeverity::Critical,
                    HashMap::from([
                        ("failure_count".to_string(), json!(failure_count)),
                        ("access_type".to_string(), json!(access_type)),
                    ]),
                ));
            }
        }

        raised.into_iter().next()
    }

    /// Record a sync attempt; failures at or past `sync_failure_threshold`
    /// raise a High `SyncFailure` alert.
    pub fn monitor_sync(
        &self,
        success: bool,
        details: Option<HashMap<String, Value>>,
    ) -> Option<AnomalyAlert> {
        if success {
            return None;
        }

        let now = self.clock.now();
        let mut state = self.state();
        state.sync_failures += 1;

        if state.sync_failures < self.config.sync_failure_threshold {
            return None;
        }

        let failure_count = state.sync_failures;
        Some(self.push_alert(
            &mut state,
            now,
            AnomalyKind::SyncFailure,
            AlertSeverity::High,
            HashMap::from([
                ("failure_count".to_string(), json!(failure_count)),
                ("details".to_string(), json!(details.unwrap_or_default())),
            ]),
        ))
    }

    /// Record a request that fell outside the entity's horizon; violations at
    /// or past `spatial_violation_threshold` raise a Medium
    /// `SpatialViolation` alert.
    pub fn monitor_spatial(&self, location: &SphericalCoordinate) -> Option<AnomalyAlert> {
        let now = self.clock.now();
        let mut state = self.state();
        state.spatial_violations += 1;

        if state.spatial_violations < self.config.spatial_violation_threshold {
            return None;
        }

        let violation_count = state.spatial_violations;
        Some(self.push_alert(
            &mut state,
            now,
            AnomalyKind::SpatialViolation,
            AlertSeverity::Medium,
            HashMap::from([
                ("violation_count".to_string(), json!(violation_count)),
                (
                    "location".to_string(),
                    serde_json::to_value(location).unwrap_or_default(),
                ),
            ]),
        ))
    }

    /// Raise an alert directly, e.g. a `DataPattern` finding from an
    /// external analyzer.
    pub fn raise_alert(
        &self,
        kind: AnomalyKind,
        severity: AlertSeverity,
        details: HashMap<String, Value>,
    ) -> AnomalyAlert {
        let now = self.clock.now();
        let mut state = self.state();
        self.push_alert(&mut state, now, kind, severity, details)
    }

    /// Number the alert and append it while the caller holds the lock.
    fn push_alert(
        &self,
        state: &mut MonitorState,
        now: DateTime<Utc>,
        kind: AnomalyKind,
        severity: AlertSeverity,
        details: HashMap<String, Value>,
    ) -> AnomalyAlert {
        state.alert_count += 1;
        let alert = AnomalyAlert {
            id: format!("{}_alert_{}", self.entity_id, state.alert_count),
            entity_id: self.entity_id.clone(),
            kind,
            severity,
            created_at: now,
            details,
            resolved: false,
            resolved_at: None,
            resolution_note: None,
        };

        warn!(
            target: "audit",
            entity_id = %self.entity_id,
            alert_id = %alert.id,
            kind = kind.as_str(),
            severity = severity.as_str(),
            "Anomaly detected"
        );

        state.alerts.push(alert.clone());
        alert
    }

    /// Mark an alert resolved. False if unknown or already resolved.
    pub fn resolve_alert(&self, alert_id: &str, note: impl Into<String>) -> bool {
        let now = self.clock.now();
        let mut state = self.state();

        let Some(alert) = state
            .alerts
            .iter_mut()
            .find(|alert| alert.id == alert_id && !alert.resolved)
        else {
            return false;
        };

        alert.resolved = true;
        alert.resolved_at = Some(now);
        alert.resolution_note = Some(note.into());

        debug!(entity_id = %self.entity_id, alert_id = %alert_id, "Alert resolved");
        true
    }

    /// Unresolved alerts at or above `min_severity`, oldest first.
    pub fn active_alerts(&self, min_severity: AlertSeverity) -> Vec<AnomalyAlert> {
        self.state()
            .alerts
            .iter()
            .filter(|alert| alert.is_active_at_least(min_severity))
            .cloned()
            .collect()
    }

    /// Every retained alert, resolved or not, oldest first.
    pub fn alerts(&self) -> Vec<AnomalyAlert> {
        self.state().alerts.clone()
    }

    /// Drop resolved alerts older than `alert_expiry`. Unresolved alerts are
    /// kept regardless of age.
    ///
    /// Returns the number of alerts removed.
    pub fn sweep_expired(&self) -> usize {
        let cutoff = saturating_sub(self.clock.now(), self.config.alert_expiry());
        let mut state = self.state();

        let before = state.alerts.len();
        state
            .alerts
            .retain(|alert| !alert.resolved || alert.created_at > cutoff);
        before - state.alerts.len()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> MonitorStats {
        let now = self.clock.now();
        let mut state = self.state();

        MonitorStats {
            accesses_in_window: state.pattern.count_in_window(now),
            access_types: state.pattern.access_types().clone(),
            auth_failures: state.auth_failures,
            sync_failures: state.sync_failures,
            spatial_violations: state.spatial_violations,
            total_alerts: state.alerts.len(),
            active_alerts: state.alerts.iter().filter(|alert| !alert.resolved).count(),
        }
    }
}

impl std::fmt::Debug for IntrusionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrusionMonitor")
            .field("entity_id", &self.entity_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
