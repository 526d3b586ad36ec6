//! Bridge configuration
//!
//! Loaded once at startup from a YAML file. Any structural problem is a
//! hard error before the bridge talks to either collaborator, so a
//! misconfigured instance never half-starts.

use serde::Deserialize;
use std::path::Path;

use crate::error::Error;

/// Main configuration for the bridge (`bridge.yml`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BridgeConfig {
    /// Telegram bot token.
    pub token: String,

    /// Poll pacing in seconds; also used as the long-poll timeout.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Cap for the poll error backoff, in seconds.
    #[serde(default)]
    pub retry_interval: Option<u64>,

    /// How long a command run may be held open waiting for a result,
    /// in seconds.
    #[serde(default = "default_wait")]
    pub wait: f64,

    /// Automation hub endpoint.
    pub hub: HubConfig,

    /// Where the chat registration map is persisted. Absent disables
    /// persistence (registrations live until restart).
    #[serde(default)]
    pub state_file: Option<String>,

    /// Push ingress for hub-triggered sends. Absent disables it.
    #[serde(default)]
    pub push: Option<PushConfig>,

    /// Command menu rows; each entry is `name:description`.
    pub menu: Vec<Vec<String>>,
}

/// Automation hub connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct HubConfig {
    /// Base URL of the hub API.
    pub url: String,

    /// Service key the bridge authenticates with.
    pub service_key: String,

    /// HTTP timeout for hub calls other than command runs, in seconds.
    #[serde(default = "default_hub_timeout")]
    pub timeout: u64,
}

/// Push ingress settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PushConfig {
    /// Listen address for the ingress server.
    #[serde(default = "default_push_listen")]
    pub listen: String,

    /// Bearer token callers must present. Absent allows unauthenticated
    /// calls (loopback deployments).
    #[serde(default)]
    pub token: Option<String>,
}

/// Upper bound for the time-valued settings, in seconds (one day).
/// The request timeout arithmetic downstream needs bounded inputs.
const MAX_TIME_SECS: u64 = 86_400;

fn default_interval() -> u64 {
    2
}

fn default_wait() -> f64 {
    60.0
}

fn default_hub_timeout() -> u64 {
    30
}

fn default_push_listen() -> String {
    "127.0.0.1:9291".to_string()
}

impl BridgeConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml_str(content: &str) -> crate::Result<Self> {
        let config: BridgeConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;

        if config.token.is_empty() {
            return Err(Error::Config("token must not be empty".to_string()));
        }
        if config.hub.url.is_empty() {
            return Err(Error::Config("hub.url must not be empty".to_string()));
        }
        if !config.wait.is_finite() || config.wait < 0.0 {
            return Err(Error::Config("wait must be a non-negative number".to_string()));
        }
        if config.wait > MAX_TIME_SECS as f64 {
            return Err(Error::Config(format!(
                "wait must not exceed {} seconds",
                MAX_TIME_SECS
            )));
        }
        if config.interval > MAX_TIME_SECS {
            return Err(Error::Config(format!(
                "interval must not exceed {} seconds",
                MAX_TIME_SECS
            )));
        }
        if config.retry_interval.is_some_and(|v| v > MAX_TIME_SECS) {
            return Err(Error::Config(format!(
                "retry-interval must not exceed {} seconds",
                MAX_TIME_SECS
            )));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
token: "123456:test-token"
interval: 5
retry-interval: 30
wait: 10.5
hub:
  url: "http://127.0.0.1:7727"
  service-key: "svc-key"
  timeout: 15
state-file: "/var/lib/bridge/state.json"
push:
  listen: "127.0.0.1:9300"
  token: "push-secret"
menu:
  - ["status:System status", "report:Daily report"]
  - ["restart:Restart service"]
"#;

    #[test]
    fn test_full_config_parsing() {
        let config = BridgeConfig::from_yaml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.token, "123456:test-token");
        assert_eq!(config.interval, 5);
        assert_eq!(config.retry_interval, Some(30));
        assert_eq!(config.wait, 10.5);
        assert_eq!(config.hub.url, "http://127.0.0.1:7727");
        assert_eq!(config.hub.service_key, "svc-key");
        assert_eq!(config.hub.timeout, 15);
        assert_eq!(config.state_file.as_deref(), Some("/var/lib/bridge/state.json"));

        let push = config.push.unwrap();
        assert_eq!(push.listen, "127.0.0.1:9300");
        assert_eq!(push.token.as_deref(), Some("push-secret"));

        assert_eq!(config.menu.len(), 2);
        assert_eq!(config.menu[0].len(), 2);
        assert_eq!(config.menu[1][0], "restart:Restart service");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = BridgeConfig::from_yaml_str(
            r#"
token: "t"
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        )
        .unwrap();

        assert_eq!(config.interval, 2);
        assert_eq!(config.retry_interval, None);
        assert_eq!(config.wait, 60.0);
        assert_eq!(config.hub.timeout, 30);
        assert!(config.state_file.is_none());
        assert!(config.push.is_none());
    }

    #[test]
    fn test_push_defaults() {
        let config = BridgeConfig::from_yaml_str(
            r#"
token: "t"
hub:
  url: "http://localhost:7727"
  service-key: "k"
push: {}
menu: []
"#,
        )
        .unwrap();

        let push = config.push.unwrap();
        assert_eq!(push.listen, "127.0.0.1:9291");
        assert!(push.token.is_none());
    }

    #[test]
    fn test_missing_token_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
token: ""
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_negative_wait_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
token: "t"
wait: -1
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_oversized_wait_rejected() {
        // Large enough to overflow the run request timeout math.
        let result = BridgeConfig::from_yaml_str(
            r#"
token: "t"
wait: 2.0e19
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
token: "t"
interval: 9999999999
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_oversized_retry_interval_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
token: "t"
retry-interval: 9999999999
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_day_long_wait_accepted() {
        let config = BridgeConfig::from_yaml_str(
            r#"
token: "t"
wait: 86400
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        )
        .unwrap();
        assert_eq!(config.wait, 86400.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = BridgeConfig::from_yaml_str(
            r#"
token: "t"
bogus: true
hub:
  url: "http://localhost:7727"
  service-key: "k"
menu: []
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let result = BridgeConfig::from_yaml_file("/nonexistent/bridge.yml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
