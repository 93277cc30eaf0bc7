//! Configuration for a protected entity.

use chrono::Duration;
use proof_auth::AuthenticatorConfig;
use serde::{Deserialize, Serialize};

/// Configuration for one protected entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Entity ID
    pub entity_id: String,
    /// Challenge/response configuration
    pub auth: AuthenticatorConfig,
    /// Intrusion monitor configuration
    pub monitor: MonitorConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            entity_id: uuid::Uuid::new_v4().to_string(),
            auth: AuthenticatorConfig::default(),
            monitor: MonitorConfig::default(),
            general: GeneralConfig::default(),
        }
    }
}

impl GateConfig {
    /// Create a new config with entity ID.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Default::default()
        }
    }

    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Intrusion monitor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Access-frequency window (seconds)
    pub window_secs: u64,
    /// Maximum accesses per window before an alert
    pub max_frequency: usize,
    /// Failed accesses before an auth-failure alert
    pub auth_failure_threshold: u64,
    /// Failed syncs before a sync-failure alert
    pub sync_failure_threshold: u64,
    /// Spatial violations before a spatial alert
    pub spatial_violation_threshold: u64,
    /// Age after which resolved alerts are dropped (seconds)
    pub alert_expiry_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            window_secs: 3600, // 1 hour
            max_frequency: 1000,
            auth_failure_threshold: 5,
            sync_failure_threshold: 3,
            spatial_violation_threshold: 2,
            alert_expiry_secs: 86400, // 24 hours
        }
    }
}

impl MonitorConfig {
    /// Access window as a duration.
    pub fn window(&self) -> Duration {
        Duration::seconds(saturating_secs(self.window_secs))
    }

    /// Resolved-alert retention as a duration.
    pub fn alert_expiry(&self) -> Duration {
        Duration::seconds(saturating_secs(self.alert_expiry_secs))
    }
}

/// General settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Emit grant/deny records on the audit target
    pub audit_enabled: bool,
    /// Rate-limit source used when a request names none
    pub default_source: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_enabled: true,
            default_source: "spatial_check".to_string(),
        }
    }
}

fn saturating_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert!(!config.entity_id.is_empty());
        assert_eq!(config.monitor.window(), Duration::hours(1));
        assert_eq!(config.monitor.max_frequency, 1000);
        assert_eq!(config.auth.max_attempts, 5);
        assert_eq!(config.general.default_source, "spatial_check");
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = GateConfig::new("entity-1");
        let yaml = config.to_yaml().unwrap();
        let parsed = GateConfig::from_yaml(&yaml).unwrap();

        assert_eq!(parsed.entity_id, "entity-1");
        assert_eq!(parsed.monitor, config.monitor);
        assert_eq!(parsed.auth, config.auth);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "entity_id: sensor-7\nmonitor:\n  max_frequency: 10\nauth:\n  max_attempts: 2\n";
        let config = GateConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.entity_id, "sensor-7");
        assert_eq!(config.monitor.max_frequency, 10);
        assert_eq!(config.monitor.auth_failure_threshold, 5);
        assert_eq!(config.auth.max_attempts, 2);
        assert_eq!(config.auth.challenge_timeout_secs, 30);
        assert!(config.general.audit_enabled);
    }

    #[test]
    fn test_oversized_seconds_saturate() {
        let yaml = "monitor:\n  window_secs: 18446744073709551615\n  alert_expiry_secs: 100000000000000\n";
        let config = GateConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.monitor.window(), Duration::seconds(i64::MAX / 1000));
        assert_eq!(config.monitor.alert_expiry(), Duration::seconds(100_000_000_000_000));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(GateConfig::from_yaml("monitor: [not, a, map]").is_err());
    }
}
