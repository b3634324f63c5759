//! Sync sinks.
//!
//! The reconciler hands every table definition, cluster record and batch
//! of rows to a [`SyncSink`]. [`StoreSink`] persists them; [`EventSink`]
//! streams them to a plugin host, table definitions first.

use crate::error::SyncError;
use inventory_model::{ClusterRecord, ResourceRecord, ResourceRow, TableDefinition};
use inventory_store::InventoryStore;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Destination for synced records.
#[async_trait::async_trait]
pub trait SyncSink: Send + Sync {
    /// Whether resource rows need their cluster row written first, even
    /// when the cluster table is filtered out
    fn requires_cluster_row(&self) -> bool {
        false
    }

    /// Called once before any record, with every table in scope
    async fn prepare(&self, tables: &[TableDefinition]) -> Result<(), SyncError>;

    /// Write one cluster row
    async fn write_cluster(&self, record: &ClusterRecord) -> Result<(), SyncError>;

    /// Write one kind's rows for one cluster, all or nothing
    async fn write_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: Vec<ResourceRow>,
    ) -> Result<usize, SyncError>;
}

/// Persists into an [`InventoryStore`].
#[derive(Clone)]
pub struct StoreSink {
    store: Arc<dyn InventoryStore>,
}

impl std::fmt::Debug for StoreSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSink").finish_non_exhaustive()
    }
}

impl StoreSink {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl SyncSink for StoreSink {
    // Resource tables reference k8s_clusters
    fn requires_cluster_row(&self) -> bool {
        true
    }

    async fn prepare(&self, _tables: &[TableDefinition]) -> Result<(), SyncError> {
        self.store.ensure_schema().await?;
        Ok(())
    }

    async fn write_cluster(&self, record: &ClusterRecord) -> Result<(), SyncError> {
        self.store.upsert_cluster(record).await?;
        Ok(())
    }

    async fn write_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: Vec<ResourceRow>,
    ) -> Result<usize, SyncError> {
        Ok(self.store.upsert_resources(cluster_uid, context_name, &rows).await?)
    }
}

/// Message streamed to a plugin host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    /// A table the host must create before inserts arrive
    MigrateTable(TableDefinition),
    /// One cluster row
    InsertCluster(ClusterRecord),
    /// One resource row
    Insert(ResourceRecord),
}

/// Streams messages over a channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<SyncMessage>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<SyncMessage>) -> Self {
        Self { tx }
    }

    async fn send(&self, message: SyncMessage) -> Result<(), SyncError> {
        self.tx.send(message).await.map_err(|_closed| SyncError::SinkClosed)
    }
}

#[async_trait::async_trait]
impl SyncSink for EventSink {
    async fn prepare(&self, tables: &[TableDefinition]) -> Result<(), SyncError> {
        for table in tables {
            self.send(SyncMessage::MigrateTable(table.clone())).await?;
        }
        Ok(())
    }

    async fn write_cluster(&self, record: &ClusterRecord) -> Result<(), SyncError> {
        self.send(SyncMessage::InsertCluster(record.clone())).await
    }

    async fn write_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: Vec<ResourceRow>,
    ) -> Result<usize, SyncError> {
        let count = rows.len();
        for row in rows {
            self.send(SyncMessage::Insert(ResourceRecord {
                cluster_uid: cluster_uid.to_string(),
                context_name: context_name.to_string(),
                row,
            }))
            .await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use inventory_model::{ResourceKind, ServiceRow};

    #[tokio::test]
    async fn test_event_sink_streams_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let sink = EventSink::new(tx);

        sink.prepare(&[TableDefinition::for_kind(ResourceKind::Service)]).await.unwrap();
        let row = ResourceRow::Service(ServiceRow {
            uid: "s1".to_string(),
            namespace: "default".to_string(),
            name: "kubernetes".to_string(),
            service_type: "ClusterIP".to_string(),
            cluster_ip: "10.96.0.1".to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        });
        let written = sink.write_resources("c1", "dev", vec![row]).await.unwrap();
        assert_eq!(written, 1);
        drop(sink);

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, SyncMessage::MigrateTable(ref t) if t.name == "k8s_services"));
        let second = rx.recv().await.unwrap();
        let SyncMessage::Insert(record) = second else {
            panic!("expected insert, got {second:?}");
        };
        assert_eq!(record.key(), ("c1", "s1"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_fatal() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = EventSink::new(tx);
        let err = sink.prepare(&TableDefinition::all()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_message_serializes_with_type_tag() {
        let message = SyncMessage::MigrateTable(TableDefinition::for_kind(ResourceKind::Pod));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "migrate_table");
        assert_eq!(value["name"], "k8s_pods");
    }
}
