//! In-memory inventory store for unit testing
//!
//! Enforces the same rules as the PostgreSQL tables: resource rows need an
//! existing cluster row, a cluster keeps its first-seen `created_at`, and a
//! batch is applied entirely or not at all.

use crate::error::StoreError;
use crate::InventoryStore;
use chrono::{DateTime, Utc};
use inventory_model::{ClusterRecord, ResourceKind, ResourceRecord, ResourceRow};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A stored cluster row with its bookkeeping timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCluster {
    pub record: ClusterRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    schema_ready: bool,
    clusters: BTreeMap<String, StoredCluster>,
    resources: BTreeMap<(ResourceKind, String, String), ResourceRecord>,
    failing: BTreeSet<ResourceKind>,
    unavailable: bool,
}

/// Mock inventory store for testing
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every batch containing `kind` fail
    pub fn fail_kind(&self, kind: ResourceKind) {
        self.state().failing.insert(kind);
    }

    /// Make every later write fail as if the pool timed out
    pub fn go_offline(&self) {
        self.state().unavailable = true;
    }

    /// Whether [`InventoryStore::ensure_schema`] has run
    pub fn schema_ready(&self) -> bool {
        self.state().schema_ready
    }

    /// Cluster row by identity
    pub fn cluster(&self, cluster_uid: &str) -> Option<StoredCluster> {
        self.state().clusters.get(cluster_uid).cloned()
    }

    /// All cluster rows, ordered by identity
    pub fn clusters(&self) -> Vec<StoredCluster> {
        self.state().clusters.values().cloned().collect()
    }

    /// All rows of `kind`, ordered by `(cluster_uid, uid)`
    pub fn resources(&self, kind: ResourceKind) -> Vec<ResourceRecord> {
        self.state()
            .resources
            .iter()
            .filter(|((k, _, _), _)| *k == kind)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Number of rows of `kind`
    pub fn count(&self, kind: ResourceKind) -> usize {
        if kind == ResourceKind::ClusterInfo {
            return self.state().clusters.len();
        }
        self.state().resources.keys().filter(|(k, _, _)| *k == kind).count()
    }
}

#[async_trait::async_trait]
impl InventoryStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.state().schema_ready = true;
        Ok(())
    }

    async fn upsert_cluster(&self, record: &ClusterRecord) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        if state.failing.contains(&ResourceKind::ClusterInfo) {
            return Err(StoreError::Persistence(sqlx::Error::Protocol(
                "injected cluster failure".to_string(),
            )));
        }

        let created_at = state
            .clusters
            .get(&record.cluster_uid)
            .map_or(record.synced_at, |existing| existing.created_at);
        state.clusters.insert(
            record.cluster_uid.clone(),
            StoredCluster {
                record: record.clone(),
                created_at,
                updated_at: record.synced_at,
            },
        );
        Ok(())
    }

    async fn upsert_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: &[ResourceRow],
    ) -> Result<usize, StoreError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        if rows.is_empty() {
            return Ok(0);
        }
        if !state.clusters.contains_key(cluster_uid) {
            return Err(StoreError::MissingCluster(cluster_uid.to_string()));
        }
        if let Some(kind) = rows.iter().map(ResourceRow::kind).find(|k| state.failing.contains(k)) {
            return Err(StoreError::Persistence(sqlx::Error::Protocol(format!(
                "injected {kind} failure"
            ))));
        }

        for row in rows {
            state.resources.insert(
                (row.kind(), cluster_uid.to_string(), row.uid().to_string()),
                ResourceRecord {
                    cluster_uid: cluster_uid.to_string(),
                    context_name: context_name.to_string(),
                    row: row.clone(),
                },
            );
        }
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory_model::{ClusterInfo, NamespaceRow};

    fn cluster(uid: &str, context: &str, synced_at: DateTime<Utc>) -> ClusterRecord {
        ClusterRecord {
            cluster_uid: uid.to_string(),
            context_name: context.to_string(),
            info: ClusterInfo {
                name: context.to_string(),
                server: format!("https://{context}:6443"),
                ca_file: String::new(),
                insecure_skip_verify: false,
                namespace: "default".to_string(),
                kubernetes_version: "v1.30.0".to_string(),
                node_count: 1,
            },
            synced_at,
        }
    }

    fn namespace(uid: &str, name: &str) -> ResourceRow {
        ResourceRow::Namespace(NamespaceRow {
            uid: uid.to_string(),
            name: name.to_string(),
            status: "Active".to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }

    #[tokio::test]
    async fn test_cluster_keeps_first_seen() {
        let store = MemoryStore::new();
        let first = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let second = DateTime::from_timestamp(1_700_000_600, 0).unwrap();

        store.upsert_cluster(&cluster("c1", "dev", first)).await.unwrap();
        store.upsert_cluster(&cluster("c1", "dev-alias", second)).await.unwrap();

        let stored = store.cluster("c1").unwrap();
        assert_eq!(stored.created_at, first);
        assert_eq!(stored.updated_at, second);
        assert_eq!(stored.record.context_name, "dev-alias");
        assert_eq!(store.count(ResourceKind::ClusterInfo), 1);
    }

    #[tokio::test]
    async fn test_resources_require_cluster() {
        let store = MemoryStore::new();
        let err = store
            .upsert_resources("missing", "dev", &[namespace("n1", "default")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingCluster(uid) if uid == "missing"));
        assert_eq!(store.count(ResourceKind::Namespace), 0);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        store.upsert_cluster(&cluster("c1", "dev", Utc::now())).await.unwrap();

        let rows = [namespace("n1", "default"), namespace("n2", "kube-system")];
        store.upsert_resources("c1", "dev", &rows).await.unwrap();
        store.upsert_resources("c1", "dev", &rows).await.unwrap();

        assert_eq!(store.count(ResourceKind::Namespace), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = MemoryStore::new();
        store.upsert_cluster(&cluster("c1", "dev", Utc::now())).await.unwrap();
        store.fail_kind(ResourceKind::Namespace);

        let result = store.upsert_resources("c1", "dev", &[namespace("n1", "default")]).await;
        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(store.resources(ResourceKind::Namespace).is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_rejects_writes() {
        let store = MemoryStore::new();
        store.upsert_cluster(&cluster("c1", "dev", Utc::now())).await.unwrap();
        store.go_offline();

        let err = store.upsert_cluster(&cluster("c1", "dev", Utc::now())).await.unwrap_err();
        assert!(err.is_unavailable());
        let err = store.upsert_resources("c1", "dev", &[namespace("n1", "default")]).await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(store.count(ResourceKind::Namespace), 0);
    }
}
