//! Storage backend trait

use async_trait::async_trait;

use crate::error::Result;

/// A key/value backend holding persisted credential state.
///
/// Values arrive already serialized; protecting them at rest is the
/// backend's responsibility.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persist a value under a key
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch a value by key
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Remove a value by key
    async fn remove(&self, key: &str) -> Result<()>;

    /// Whether a key exists
    async fn contains(&self, key: &str) -> Result<bool>;

    /// All keys with the given prefix
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove everything
    async fn clear(&self) -> Result<()>;

    /// Whether this backend sits on OS or hardware protection
    fn is_hardware_backed(&self) -> bool;

    /// Human-readable backend name
    fn backend_name(&self) -> &'static str;
}
