//! Service provider

use super::{Meta, ResourceProvider};
use crate::client::ClusterClient;
use crate::error::InventoryError;
use inventory_model::{ResourceKind, ResourceRow, ServiceRow};
use k8s_openapi::api::core::v1::Service;

/// Lists services in all namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceProvider;

pub(crate) fn project(service: &Service) -> ServiceRow {
    let meta = Meta::of(&service.metadata);
    let spec = service.spec.as_ref();
    ServiceRow {
        uid: meta.uid,
        namespace: meta.namespace,
        name: meta.name,
        service_type: spec
            .and_then(|s| s.type_.clone())
            .unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec.and_then(|s| s.cluster_ip.clone()).unwrap_or_default(),
        created_at: meta.created_at,
    }
}

#[async_trait::async_trait]
impl ResourceProvider for ServiceProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Service
    }

    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError> {
        let services = client.list_services().await?;
        Ok(services.iter().map(|s| ResourceRow::Service(project(s))).collect())
    }
}
