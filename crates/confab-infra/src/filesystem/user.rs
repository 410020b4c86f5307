//! File-backed user store.
//!
//! The logged-in user lives in `{data_dir}/user.json`. A file that cannot be
//! parsed is deleted and treated as "nobody logged in".

use std::path::{Path, PathBuf};

use confab_core::repository::UserStore;
use confab_types::chat::User;
use confab_types::error::StoreError;

use super::user_path;

pub struct FileUserStore {
    path: PathBuf,
}

impl FileUserStore {
    /// Store under `{data_dir}/user.json`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: user_path(data_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserStore for FileUserStore {
    async fn load(&self) -> Result<Option<User>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str::<User>(&content) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                tracing::warn!("Discarding unreadable {}: {err}", self.path.display());
                self.clear().await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(user).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!(user_id = %user.user_id, "User saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sam() -> User {
        User {
            user_id: "u-42".to_string(),
            username: "sam".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_without_file_is_none() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(&dir.path().join("nested"));

        store.save(&sam()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(sam()));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_user() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path());
        store.save(&sam()).await.unwrap();

        let alex = User {
            user_id: "u-7".to_string(),
            username: "alex".to_string(),
        };
        store.save(&alex).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(alex));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_removed() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path());
        tokio::fs::write(store.path(), "{not json").await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = FileUserStore::new(dir.path());
        store.save(&sam()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
