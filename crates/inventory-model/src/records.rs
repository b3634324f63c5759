//! Canonical rows and persisted records.
//!
//! Rows are what a provider projects out of live cluster objects. Records
//! wrap rows with the cluster identity they belong to and the context name
//! they were observed through.

use crate::kind::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated cluster metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    /// Cluster name from the context (falls back to the context name)
    pub name: String,
    /// API server endpoint
    pub server: String,
    /// CA bundle path, empty when none is configured
    pub ca_file: String,
    /// Whether TLS verification is skipped
    pub insecure_skip_verify: bool,
    /// Default namespace of the context
    pub namespace: String,
    /// Reported server version, empty when it could not be read
    pub kubernetes_version: String,
    /// Number of nodes, zero when they could not be listed
    pub node_count: i64,
}

/// Namespace row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRow {
    pub uid: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Pod row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRow {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Deployment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRow {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    /// Desired replicas
    pub replicas: i32,
    /// Ready replicas
    pub ready: i32,
    pub created_at: DateTime<Utc>,
}

/// Service row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRow {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    /// `ClusterIP`, `NodePort`, `LoadBalancer` or `ExternalName`
    pub service_type: String,
    pub cluster_ip: String,
    pub created_at: DateTime<Utc>,
}

/// CustomResourceDefinition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrdRow {
    pub uid: String,
    pub name: String,
    pub group: String,
    pub kind: String,
    pub plural: String,
    /// `Cluster` or `Namespaced`
    pub scope: String,
    pub created_at: DateTime<Utc>,
}

/// A row of any provider-listed kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceRow {
    Namespace(NamespaceRow),
    Pod(PodRow),
    Deployment(DeploymentRow),
    Service(ServiceRow),
    CustomResourceDefinition(CrdRow),
}

impl ResourceRow {
    /// Kind of this row.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRow::Namespace(_) => ResourceKind::Namespace,
            ResourceRow::Pod(_) => ResourceKind::Pod,
            ResourceRow::Deployment(_) => ResourceKind::Deployment,
            ResourceRow::Service(_) => ResourceKind::Service,
            ResourceRow::CustomResourceDefinition(_) => ResourceKind::CustomResourceDefinition,
        }
    }

    /// Kind-native unique id (unique within one cluster only).
    #[must_use]
    pub fn uid(&self) -> &str {
        match self {
            ResourceRow::Namespace(r) => &r.uid,
            ResourceRow::Pod(r) => &r.uid,
            ResourceRow::Deployment(r) => &r.uid,
            ResourceRow::Service(r) => &r.uid,
            ResourceRow::CustomResourceDefinition(r) => &r.uid,
        }
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ResourceRow::Namespace(r) => &r.name,
            ResourceRow::Pod(r) => &r.name,
            ResourceRow::Deployment(r) => &r.name,
            ResourceRow::Service(r) => &r.name,
            ResourceRow::CustomResourceDefinition(r) => &r.name,
        }
    }
}

/// One persisted cluster row, keyed by `cluster_uid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Endpoint-derived identity, see [`crate::cluster_uid`]
    pub cluster_uid: String,
    /// Context the cluster was last observed through (display only)
    pub context_name: String,
    #[serde(flatten)]
    pub info: ClusterInfo,
    /// Time of this observation
    pub synced_at: DateTime<Utc>,
}

/// One persisted resource row, keyed by `(cluster_uid, row.uid())`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub cluster_uid: String,
    /// Context the object was observed through (display only)
    pub context_name: String,
    pub row: ResourceRow,
}

impl ResourceRecord {
    /// Composite key of this record.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.cluster_uid, self.row.uid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(uid: &str) -> ResourceRow {
        ResourceRow::Pod(PodRow {
            uid: uid.to_string(),
            namespace: "default".to_string(),
            name: "web-0".to_string(),
            status: "Running".to_string(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        })
    }

    #[test]
    fn test_row_kind_and_uid() {
        let row = pod("a1");
        assert_eq!(row.kind(), ResourceKind::Pod);
        assert_eq!(row.uid(), "a1");
        assert_eq!(row.name(), "web-0");
    }

    #[test]
    fn test_record_key_is_composite() {
        let record = ResourceRecord {
            cluster_uid: "c1".to_string(),
            context_name: "dev".to_string(),
            row: pod("a1"),
        };
        assert_eq!(record.key(), ("c1", "a1"));
    }

    #[test]
    fn test_row_serializes_with_kind_tag() {
        let value = serde_json::to_value(pod("a1")).unwrap();
        assert_eq!(value["kind"], "pod");
        assert_eq!(value["uid"], "a1");
    }
}
