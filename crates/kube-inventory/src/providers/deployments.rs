//! Deployment provider

use super::{Meta, ResourceProvider};
use crate::client::ClusterClient;
use crate::error::InventoryError;
use inventory_model::{DeploymentRow, ResourceKind, ResourceRow};
use k8s_openapi::api::apps::v1::Deployment;

/// Lists deployments in all namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeploymentProvider;

/// Desired replicas come from the spec (the API defaults them to 1);
/// ready replicas from the status.
pub(crate) fn project(deployment: &Deployment) -> DeploymentRow {
    let meta = Meta::of(&deployment.metadata);
    DeploymentRow {
        uid: meta.uid,
        namespace: meta.namespace,
        name: meta.name,
        replicas: deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1),
        ready: deployment
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or(0),
        created_at: meta.created_at,
    }
}

#[async_trait::async_trait]
impl ResourceProvider for DeploymentProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Deployment
    }

    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError> {
        let deployments = client.list_deployments().await?;
        Ok(deployments
            .iter()
            .map(|d| ResourceRow::Deployment(project(d)))
            .collect())
    }
}
