//! Mock cluster source for unit testing
//!
//! In-memory clusters that can be configured to fail at any step
//! (connect, version, nodes, or a single kind's listing), so reconciler
//! tests can run without a Kubernetes API server.
//!
//! - `mod.rs` - `MockClusterSource` and `MockClusterClient`
//! - `helpers.rs` - builders for Kubernetes objects

pub mod helpers;

use crate::client::{ClusterClient, ClusterSource};
use crate::error::InventoryError;
use crate::registry::ClusterContext;
use inventory_model::ResourceKind;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Pod, Service};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared log of `(context, kind)` list calls.
type CallLog = Arc<Mutex<Vec<(String, ResourceKind)>>>;

/// Mock cluster for testing
#[derive(Debug, Clone)]
pub struct MockClusterClient {
    context: ClusterContext,
    version: Result<String, String>,
    nodes: Result<i64, String>,
    namespaces: Vec<Namespace>,
    pods: Vec<Pod>,
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    crds: Vec<CustomResourceDefinition>,
    failures: HashMap<ResourceKind, String>,
    calls: CallLog,
}

impl MockClusterClient {
    /// Create an empty, healthy cluster reachable through `context_name`.
    pub fn new(context_name: impl Into<String>, server: impl Into<String>) -> Self {
        let name = context_name.into();
        Self {
            context: ClusterContext {
                cluster_name: format!("{name}-cluster"),
                name,
                server: server.into(),
                namespace: "default".to_string(),
                ca_file: String::new(),
                insecure_skip_verify: false,
            },
            version: Ok("v1.30.0".to_string()),
            nodes: Ok(1),
            namespaces: Vec::new(),
            pods: Vec::new(),
            deployments: Vec::new(),
            services: Vec::new(),
            crds: Vec::new(),
            failures: HashMap::new(),
            calls: Arc::default(),
        }
    }

    /// Mutable access to the context (for test setup)
    pub fn context_mut(&mut self) -> &mut ClusterContext {
        &mut self.context
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Ok(version.to_string());
        self
    }

    #[must_use]
    pub fn failing_version(mut self, message: &str) -> Self {
        self.version = Err(message.to_string());
        self
    }

    #[must_use]
    pub fn with_nodes(mut self, count: i64) -> Self {
        self.nodes = Ok(count);
        self
    }

    #[must_use]
    pub fn failing_nodes(mut self, message: &str) -> Self {
        self.nodes = Err(message.to_string());
        self
    }

    #[must_use]
    pub fn with_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
        self.namespaces = namespaces;
        self
    }

    #[must_use]
    pub fn with_pods(mut self, pods: Vec<Pod>) -> Self {
        self.pods = pods;
        self
    }

    #[must_use]
    pub fn with_deployments(mut self, deployments: Vec<Deployment>) -> Self {
        self.deployments = deployments;
        self
    }

    #[must_use]
    pub fn with_services(mut self, services: Vec<Service>) -> Self {
        self.services = services;
        self
    }

    #[must_use]
    pub fn with_crds(mut self, crds: Vec<CustomResourceDefinition>) -> Self {
        self.crds = crds;
        self
    }

    /// Make listing `kind` fail with `message`
    #[must_use]
    pub fn failing(mut self, kind: ResourceKind, message: &str) -> Self {
        self.failures.insert(kind, message.to_string());
        self
    }

    /// Kinds listed through this client (and its clones)
    pub fn listed(&self) -> Vec<ResourceKind> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, kind)| *kind)
            .collect()
    }

    fn record<T: Clone>(
        &self,
        kind: ResourceKind,
        resource: &'static str,
        items: &[T],
    ) -> Result<Vec<T>, InventoryError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.context.name.clone(), kind));

        match self.failures.get(&kind) {
            Some(message) => Err(InventoryError::Fetch {
                resource,
                message: message.clone(),
            }),
            None => Ok(items.to_vec()),
        }
    }
}

#[async_trait::async_trait]
impl ClusterClient for MockClusterClient {
    fn context(&self) -> &ClusterContext {
        &self.context
    }

    async fn server_version(&self) -> Result<String, InventoryError> {
        self.version.clone().map_err(|message| InventoryError::Unavailable {
            field: "kubernetes_version",
            message,
        })
    }

    async fn count_nodes(&self) -> Result<i64, InventoryError> {
        self.nodes.clone().map_err(|message| InventoryError::Unavailable {
            field: "node_count",
            message,
        })
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, InventoryError> {
        self.record(ResourceKind::Namespace, "namespaces", &self.namespaces)
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, InventoryError> {
        self.record(ResourceKind::Pod, "pods", &self.pods)
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, InventoryError> {
        self.record(ResourceKind::Deployment, "deployments", &self.deployments)
    }

    async fn list_services(&self) -> Result<Vec<Service>, InventoryError> {
        self.record(ResourceKind::Service, "services", &self.services)
    }

    async fn list_crds(&self) -> Result<Vec<CustomResourceDefinition>, InventoryError> {
        self.record(
            ResourceKind::CustomResourceDefinition,
            "customresourcedefinitions",
            &self.crds,
        )
    }
}

/// Mock cluster source for testing
///
/// Every cluster added shares one call log, so tests can assert which
/// `(context, kind)` pairs were listed across the whole run.
#[derive(Debug, Clone, Default)]
pub struct MockClusterSource {
    clusters: Vec<(MockClusterClient, Option<String>)>,
    calls: CallLog,
}

impl MockClusterSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reachable cluster
    pub fn add_cluster(&mut self, mut cluster: MockClusterClient) {
        cluster.calls = Arc::clone(&self.calls);
        self.clusters.push((cluster, None));
    }

    /// Add a context whose connection fails with `message`
    pub fn add_unreachable(&mut self, context_name: &str, server: &str, message: &str) {
        let cluster = MockClusterClient::new(context_name, server);
        self.clusters.push((cluster, Some(message.to_string())));
    }

    /// Every `(context, kind)` listed so far
    pub fn listed(&self) -> Vec<(String, ResourceKind)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl ClusterSource for MockClusterSource {
    fn contexts(&self) -> Result<Vec<ClusterContext>, InventoryError> {
        if self.clusters.is_empty() {
            return Err(InventoryError::Configuration(
                "no contexts configured".to_string(),
            ));
        }
        Ok(self.clusters.iter().map(|(c, _)| c.context.clone()).collect())
    }

    async fn connect(&self, context: &ClusterContext) -> Result<Box<dyn ClusterClient>, InventoryError> {
        let (cluster, failure) = self
            .clusters
            .iter()
            .find(|(c, _)| c.context.name == context.name)
            .ok_or_else(|| InventoryError::NotFound(context.name.clone()))?;

        match failure {
            Some(message) => Err(InventoryError::Connection {
                context: context.name.clone(),
                message: message.clone(),
            }),
            None => Ok(Box::new(cluster.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::helpers::*;
    use super::*;

    #[tokio::test]
    async fn test_unreachable_context_fails_to_connect() {
        let mut source = MockClusterSource::new();
        source.add_unreachable("prod", "https://prod:6443", "connection refused");

        let contexts = source.contexts().unwrap();
        let err = source.connect(&contexts[0]).await.err().unwrap();
        assert!(matches!(err, InventoryError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_failing_kind_is_recorded() {
        let mut source = MockClusterSource::new();
        source.add_cluster(
            MockClusterClient::new("dev", "https://dev:6443")
                .with_pods(vec![pod("p1", "default", "web", "Running")])
                .failing(ResourceKind::Namespace, "forbidden"),
        );

        let contexts = source.contexts().unwrap();
        let client = source.connect(&contexts[0]).await.unwrap();
        assert!(client.list_namespaces().await.is_err());
        assert_eq!(client.list_pods().await.unwrap().len(), 1);
        assert_eq!(
            source.listed(),
            vec![
                ("dev".to_string(), ResourceKind::Namespace),
                ("dev".to_string(), ResourceKind::Pod),
            ]
        );
    }
}
