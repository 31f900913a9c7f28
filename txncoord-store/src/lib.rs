//! A narrow facade over the coordination store (a ZooKeeper-style
//! hierarchical, watchable key-value store with ephemeral nodes and session
//! semantics). The core never talks to a ZooKeeper client type directly --
//! everything goes through [`StoreClient`], so the rest of the system is
//! testable against [`fake::FakeStore`] without a running ensemble.

mod error;
mod fake;
mod watch;
mod zk;

pub use error::StoreError;
pub use fake::FakeStore;
pub use watch::Watch;
pub use zk::ZkStoreClient;

use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Watch channels fire at most once; every caller must re-register after
/// consuming one. There is no persistent subscription in this model.
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn create(&self, path: &str, data: &[u8]) -> StoreResult<()>;
    async fn create_ephemeral(&self, path: &str, data: &[u8]) -> StoreResult<()>;
    /// Unconditional set, ignoring version.
    async fn set(&self, path: &str, data: &[u8]) -> StoreResult<()>;
    async fn get(&self, path: &str) -> StoreResult<Vec<u8>>;
    async fn get_and_watch(&self, path: &str) -> StoreResult<(Vec<u8>, Watch)>;
    async fn exists(&self, path: &str) -> StoreResult<bool>;
    async fn exists_and_watch(&self, path: &str) -> StoreResult<(bool, Watch)>;
    async fn children(&self, path: &str) -> StoreResult<Vec<String>>;
    async fn children_and_watch(&self, path: &str) -> StoreResult<(Vec<String>, Watch)>;
    async fn delete(&self, path: &str) -> StoreResult<()>;
    async fn delete_recursive(&self, path: &str) -> StoreResult<()>;
}

/// Idempotently create `path` with empty data, tolerating a concurrent
/// creator. Used by TM/TW initialization, which must not fail just because
/// a previous run (or a racing peer) already laid down the tree.
pub async fn create_idempotent(store: &dyn StoreClient, path: &str) -> StoreResult<()> {
    match store.create(path, &[]).await {
        Ok(()) | Err(StoreError::AlreadyExists) => Ok(()),
        Err(e) => Err(e),
    }
}
