//! Repository port traits for durable storage.

use async_trait::async_trait;

use super::error::RepoError;

// =============================================================================
// World Settings Storage
// =============================================================================

/// World-scoped key-value store of JSON documents.
///
/// Every connected process reads and writes the same world store, so the
/// last writer of a key wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, RepoError>;
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), RepoError>;
}
