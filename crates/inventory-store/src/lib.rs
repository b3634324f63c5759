//! Inventory Store
//!
//! Persists cluster records and resource rows into the six inventory
//! tables. Writes are upserts keyed by `cluster_uid` (clusters) or
//! `(cluster_uid, uid)` (everything else), so re-running a sync converges
//! on the same rows instead of duplicating them.
//!
//! # Example
//!
//! ```no_run
//! use inventory_store::{InventoryStore, PgStore};
//!
//! # async fn example() -> Result<(), inventory_store::StoreError> {
//! let store = PgStore::connect("postgres://inventory@localhost/inventory").await?;
//! store.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod postgres;
pub mod schema;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use error::StoreError;
pub use postgres::PgStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;

use inventory_model::{ClusterRecord, ResourceRow};

/// Durable inventory storage.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    /// Create all six tables if they do not exist. Idempotent.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// Insert or update one cluster row.
    ///
    /// `created_at` is set on first insert and never changed afterwards.
    async fn upsert_cluster(&self, record: &ClusterRecord) -> Result<(), StoreError>;

    /// Insert or update `rows` for one cluster in a single transaction.
    ///
    /// Either every row is written or none is. Fails with
    /// [`StoreError::MissingCluster`] when the cluster row does not exist.
    /// Returns the number of rows written.
    async fn upsert_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: &[ResourceRow],
    ) -> Result<usize, StoreError>;
}
