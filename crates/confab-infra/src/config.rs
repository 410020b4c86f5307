//! Client configuration loader for Confab.
//!
//! Reads `config.toml` from the data directory (`~/.confab/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::Path;

use confab_types::config::ClientConfig;

/// Environment variable that overrides `backend_url` from the file.
pub const BACKEND_URL_ENV: &str = "CONFAB_BACKEND_URL";

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = crate::filesystem::config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Apply a backend URL override. Blank values are ignored.
pub fn with_backend_override(mut config: ClientConfig, backend_url: Option<String>) -> ClientConfig {
    if let Some(url) = backend_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
        tracing::debug!(backend_url = %url, "Backend URL overridden");
        config.backend_url = url;
    }
    config
}

/// Load the config file, then apply `CONFAB_BACKEND_URL` if set.
pub async fn resolve_client_config(data_dir: &Path) -> ClientConfig {
    let config = load_client_config(data_dir).await;
    with_backend_override(config, std::env::var(BACKEND_URL_ENV).ok())
}
