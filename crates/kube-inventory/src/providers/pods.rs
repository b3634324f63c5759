//! Pod provider

use super::{Meta, ResourceProvider};
use crate::client::ClusterClient;
use crate::error::InventoryError;
use inventory_model::{PodRow, ResourceKind, ResourceRow};
use k8s_openapi::api::core::v1::Pod;

/// Lists pods in all namespaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodProvider;

pub(crate) fn project(pod: &Pod) -> PodRow {
    let meta = Meta::of(&pod.metadata);
    PodRow {
        uid: meta.uid,
        namespace: meta.namespace,
        name: meta.name,
        status: pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_default(),
        created_at: meta.created_at,
    }
}

#[async_trait::async_trait]
impl ResourceProvider for PodProvider {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Pod
    }

    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError> {
        let pods = client.list_pods().await?;
        Ok(pods.iter().map(|pod| ResourceRow::Pod(project(pod))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_pod() {
        let pod: Pod = serde_json::from_value(serde_json::json!({
            "metadata": {
                "name": "web-7d4b9c-abcde",
                "namespace": "shop",
                "uid": "pod-uid-1",
                "creationTimestamp": "2024-02-01T00:00:00Z"
            },
            "spec": { "containers": [{ "name": "web", "image": "nginx" }] },
            "status": { "phase": "Running" }
        }))
        .unwrap();

        let row = project(&pod);
        assert_eq!(row.uid, "pod-uid-1");
        assert_eq!(row.namespace, "shop");
        assert_eq!(row.name, "web-7d4b9c-abcde");
        assert_eq!(row.status, "Running");
    }
}
