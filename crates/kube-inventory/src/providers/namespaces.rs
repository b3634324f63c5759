//! Namespace provider

use super::{Meta, ResourceProvider};
use crate::client::ClusterClient;
use crate::error::InventoryError;
use inventory_model::{NamespaceRow, ResourceKind, ResourceRow};
use k8s_openapi::api::core::v1::Namespace;

/// Lists namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamespaceProvider;

pub(crate) fn project(ns: &Namespace) -> NamespaceRow {
    let meta = Meta::of(&ns.metadata);
    NamespaceRow {
        uid: meta.uid,
        name: meta.name,
        status: ns
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_default(),
        created_at: meta.created_at,
    }
}

#[async_trait::async_trait]
impl ResourceProvider for NamespaceProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Namespace
    }

    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError> {
        let namespaces = client.list_namespaces().await?;
        Ok(namespaces.iter().map(|ns| ResourceRow::Namespace(project(ns))).collect())
    }
}
