//! Cluster info aggregation.
//!
//! Combines the context's display metadata with two best-effort reads: the
//! server version and a node count. Either read may fail (a control-plane
//! that forbids listing nodes is common) and degrades to an empty string or
//! zero. Every degradation is reported so callers can count it.

use crate::client::ClusterClient;
use inventory_model::ClusterInfo;
use tracing::warn;

/// A best-effort field that fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedRead {
    /// Column that was defaulted
    pub field: &'static str,
    /// Why the read failed
    pub message: String,
}

/// Cluster info plus the reads that degraded while collecting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfoReport {
    pub info: ClusterInfo,
    pub degraded: Vec<DegradedRead>,
}

/// Collect cluster info. Never fails.
pub async fn collect(client: &dyn ClusterClient) -> ClusterInfoReport {
    let context = client.context();
    let mut degraded = Vec::new();

    let kubernetes_version = match client.server_version().await {
        Ok(version) => version,
        Err(e) => {
            warn!(context = %context.name, error = %e, "Failed to read kubernetes version");
            degraded.push(DegradedRead {
                field: "kubernetes_version",
                message: e.to_string(),
            });
            String::new()
        }
    };

    let node_count = match client.count_nodes().await {
        Ok(count) => count,
        Err(e) => {
            warn!(context = %context.name, error = %e, "Failed to list nodes");
            degraded.push(DegradedRead {
                field: "node_count",
                message: e.to_string(),
            });
            0
        }
    };

    let name = if context.cluster_name.is_empty() {
        context.name.clone()
    } else {
        context.cluster_name.clone()
    };
    let namespace = if context.namespace.is_empty() {
        crate::registry::DEFAULT_NAMESPACE.to_string()
    } else {
        context.namespace.clone()
    };

    ClusterInfoReport {
        info: ClusterInfo {
            name,
            server: context.server.clone(),
            ca_file: context.ca_file.clone(),
            insecure_skip_verify: context.insecure_skip_verify,
            namespace,
            kubernetes_version,
            node_count,
        },
        degraded,
    }
}
