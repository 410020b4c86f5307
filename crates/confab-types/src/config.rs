//! Client configuration types for Confab.
//!
//! `ClientConfig` represents the `config.toml` in the data directory that
//! controls the backend address, typing indicator timeout, and reconnect
//! policy.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the chat client.
///
/// Loaded from `~/.confab/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base HTTP URL of the chat server. The WebSocket URL is derived from it.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// How long the "bot is typing" indicator stays up without a reply.
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,

    /// Request timeout for the history fetch.
    #[serde(default = "default_history_timeout_ms")]
    pub history_timeout_ms: u64,

    /// Capacity of the session's notification channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_backend_url() -> String {
    "http://localhost:8001".to_string()
}

fn default_typing_timeout_ms() -> u64 {
    5_000
}

fn default_history_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    256
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            typing_timeout_ms: default_typing_timeout_ms(),
            history_timeout_ms: default_history_timeout_ms(),
            event_capacity: default_event_capacity(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Backoff policy for reopening a dropped connection.
///
/// Delay before attempt `n` (1-based) is
/// `min(initial_delay_ms * multiplier^(n-1), max_delay_ms)`, scaled by a
/// random factor in `[1 - jitter, 1 + jitter]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Fraction of the delay to randomize, clamped to `0.0..=1.0`.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.2
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl ReconnectConfig {
    /// A policy that never reconnects.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default_values() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8001");
        assert_eq!(config.typing_timeout_ms, 5_000);
        assert_eq!(config.history_timeout_ms, 10_000);
        assert!(config.reconnect.enabled);
        assert_eq!(config.reconnect.max_attempts, 5);
    }

    #[test]
    fn test_client_config_deserialize_with_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_client_config_deserialize_with_values() {
        let toml_str = r#"
backend_url = "https://chat.example.com"
typing_timeout_ms = 8000

[reconnect]
max_attempts = 2
jitter = 0.0
"#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend_url, "https://chat.example.com");
        assert_eq!(config.typing_timeout_ms, 8_000);
        assert_eq!(config.history_timeout_ms, 10_000);
        assert_eq!(config.reconnect.max_attempts, 2);
        assert!(config.reconnect.jitter.abs() < f64::EPSILON);
        // Unspecified reconnect fields keep their defaults.
        assert_eq!(config.reconnect.initial_delay_ms, 1_000);
        assert!(config.reconnect.enabled);
    }

    #[test]
    fn test_disabled_reconnect() {
        let policy = ReconnectConfig::disabled();
        assert!(!policy.enabled);
        assert_eq!(policy.max_attempts, 5);
    }
}
