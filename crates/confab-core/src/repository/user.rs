//! User store trait definition.

use confab_types::chat::User;
use confab_types::error::StoreError;

/// Persists the identity of the person chatting between runs.
///
/// Implementations live in confab-infra (e.g., FileUserStore).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserStore: Send + Sync {
    /// The saved user, or `None` if nobody is logged in. An unreadable
    /// record is discarded and reported as `None`.
    fn load(&self) -> impl std::future::Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Save `user`, replacing any previous one.
    fn save(&self, user: &User) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Forget the saved user. Succeeds if there was none.
    fn clear(&self) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
