//! Filesystem adapters for Confab.
//!
//! Resolves the data directory and implements the `UserStore` port from
//! `confab-core` on top of a JSON file in it.

pub mod user;

use std::path::{Path, PathBuf};

pub use user::FileUserStore;

/// Environment variable that relocates the data directory.
pub const DATA_DIR_ENV: &str = "CONFAB_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CONFAB_DATA_DIR` environment variable
/// 2. `~/.confab`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".confab");
    }

    // Last resort: current directory
    PathBuf::from(".confab")
}

/// `{data_dir}/config.toml`
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// `{data_dir}/user.json`
pub fn user_path(data_dir: &Path) -> PathBuf {
    data_dir.join("user.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_paths() {
        let data_dir = PathBuf::from("/home/sam/.confab");
        assert_eq!(config_path(&data_dir), PathBuf::from("/home/sam/.confab/config.toml"));
        assert_eq!(user_path(&data_dir), PathBuf::from("/home/sam/.confab/user.json"));
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-confab");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-confab"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
