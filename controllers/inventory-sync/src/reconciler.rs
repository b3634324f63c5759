//! Reconciliation logic.
//!
//! One pass over every selected context: connect, collect cluster info and
//! write the cluster row (when selected, or when the sink needs it), then
//! list and write each selected kind. A failing context or kind is
//! recorded in the [`SyncReport`] and skipped; only fatal errors end the
//! pass.

use crate::error::SyncError;
use crate::report::SyncReport;
use crate::selection::SelectionConfig;
use crate::sink::SyncSink;
use chrono::Utc;
use inventory_model::{ClusterRecord, ResourceKind, cluster_uid};
use kube_inventory::providers::cluster_info;
use kube_inventory::{
    ClusterClient, ClusterContext, ClusterSource, InventoryError, ResourceProvider, provider_for,
};
use tracing::{debug, info, warn};

/// Reconciler for one sync run
pub struct Reconciler<'a> {
    source: &'a dyn ClusterSource,
    sink: &'a dyn SyncSink,
    selection: &'a SelectionConfig,
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl<'a> Reconciler<'a> {
    pub fn new(source: &'a dyn ClusterSource, sink: &'a dyn SyncSink, selection: &'a SelectionConfig) -> Self {
        Self { source, sink, selection }
    }

    /// Run one pass over every selected context.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        self.sink.prepare(&self.selection.tables()).await?;

        let mut report = SyncReport::default();
        for context in self.selection.contexts() {
            report.clusters_attempted += 1;
            match self.sync_cluster(context, &mut report).await {
                Ok(()) => report.clusters_synced += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(context = %context.name, error = %e, "Skipping cluster");
                    report.record_failure(&context.name, None, &e);
                }
            }
        }

        report.log_summary();
        Ok(report)
    }

    /// Sync one cluster. Errors returned here skip the whole cluster.
    async fn sync_cluster(&self, context: &ClusterContext, report: &mut SyncReport) -> Result<(), SyncError> {
        let client = self
            .source
            .connect(context)
            .await
            .map_err(|e| SyncError::from_inventory(&context.name, None, e))?;

        let uid = cluster_uid(&client.context().server);
        if self.selection.records_clusters() || self.sink.requires_cluster_row() {
            // Cluster row first: every resource row references it
            self.sync_cluster_info(client.as_ref(), &uid, report).await?;
        }

        for kind in self.selection.resource_kinds() {
            let Some(provider) = provider_for(kind) else {
                continue;
            };
            match self.sync_kind(provider, client.as_ref(), &uid).await {
                Ok(count) => report.add_rows(kind, count),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(context = %context.name, %kind, error = %e, "Failed to sync kind");
                    report.record_failure(&context.name, Some(kind), &e);
                }
            }
        }
        Ok(())
    }

    /// Collect cluster info and write the cluster row.
    async fn sync_cluster_info(
        &self,
        client: &dyn ClusterClient,
        uid: &str,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let context = client.context();
        let collected = cluster_info::collect(client).await;
        for read in collected.degraded {
            let err = SyncError::from_inventory(
                &context.name,
                None,
                InventoryError::Unavailable {
                    field: read.field,
                    message: read.message,
                },
            );
            report.record_degraded(&err);
        }

        let record = ClusterRecord {
            cluster_uid: uid.to_string(),
            context_name: context.name.clone(),
            info: collected.info,
            synced_at: Utc::now(),
        };
        self.sink.write_cluster(&record).await?;
        report.add_rows(ResourceKind::ClusterInfo, 1);
        info!(
            context = %context.name,
            cluster_uid = %record.cluster_uid,
            version = %record.info.kubernetes_version,
            nodes = record.info.node_count,
            "Cluster recorded"
        );
        Ok(())
    }

    /// List one kind in full, then write it as one batch.
    async fn sync_kind(
        &self,
        provider: &dyn ResourceProvider,
        client: &dyn ClusterClient,
        uid: &str,
    ) -> Result<usize, SyncError> {
        let kind = provider.kind();
        let context = client.context().name.as_str();
        let rows = provider
            .list(client)
            .await
            .map_err(|e| SyncError::from_inventory(context, Some(kind), e))?;

        let count = self.sink.write_resources(uid, context, rows).await?;
        debug!(context, %kind, rows = count, "Kind synced");
        Ok(count)
    }
}
