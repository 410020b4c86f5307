//! Application state shared by the CLI commands.
//!
//! AppState resolves the data directory and configuration once, and hands
//! out the concrete infra implementations of the core ports.

use std::path::PathBuf;

use anyhow::Context;

use confab_core::repository::UserStore;
use confab_infra::config::{resolve_client_config, with_backend_override};
use confab_infra::filesystem::{FileUserStore, resolve_data_dir};
use confab_infra::history::HttpHistorySource;
use confab_infra::ws::WebSocketTransport;
use confab_types::chat::User;
use confab_types::config::ClientConfig;

pub struct AppState {
    pub data_dir: PathBuf,
    pub config: ClientConfig,
    pub user_store: FileUserStore,
}

impl AppState {
    /// Resolve the data dir, load `config.toml`, and apply overrides.
    pub async fn init(backend_url: Option<String>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = with_backend_override(resolve_client_config(&data_dir).await, backend_url);
        tracing::debug!(data_dir = %data_dir.display(), backend_url = %config.backend_url, "Configuration loaded");

        Ok(Self {
            user_store: FileUserStore::new(&data_dir),
            data_dir,
            config,
        })
    }

    /// The saved user, or an error telling the caller how to log in.
    pub async fn require_user(&self) -> anyhow::Result<User> {
        self.user_store
            .load()
            .await
            .context("Failed to read saved user")?
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Run: confab login --user-id <id> --username <name>"))
    }

    pub fn transport(&self) -> anyhow::Result<WebSocketTransport> {
        WebSocketTransport::new(&self.config.backend_url).context("Invalid backend URL")
    }

    pub fn history_source(&self) -> anyhow::Result<HttpHistorySource> {
        HttpHistorySource::new(
            &self.config.backend_url,
            std::time::Duration::from_millis(self.config.history_timeout_ms),
        )
        .context("Invalid backend URL")
    }
}
