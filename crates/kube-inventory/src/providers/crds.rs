//! CustomResourceDefinition provider

use super::{Meta, ResourceProvider};
use crate::client::ClusterClient;
use crate::error::InventoryError;
use inventory_model::{CrdRow, ResourceKind, ResourceRow};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

/// Lists CustomResourceDefinitions. Only the definitions are recorded,
/// never the custom resources themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrdProvider;

pub(crate) fn project(crd: &CustomResourceDefinition) -> CrdRow {
    let meta = Meta::of(&crd.metadata);
    CrdRow {
        uid: meta.uid,
        name: meta.name,
        group: crd.spec.group.clone(),
        kind: crd.spec.names.kind.clone(),
        plural: crd.spec.names.plural.clone(),
        scope: crd.spec.scope.clone(),
        created_at: meta.created_at,
    }
}

#[async_trait::async_trait]
impl ResourceProvider for CrdProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::CustomResourceDefinition
    }

    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError> {
        let crds = client.list_crds().await?;
        Ok(crds
            .iter()
            .map(|crd| ResourceRow::CustomResourceDefinition(project(crd)))
            .collect())
    }
}
