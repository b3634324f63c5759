//! Per-cluster client abstraction.
//!
//! [`ClusterSource`] hands out connections and [`ClusterClient`] lists the
//! objects the providers project. Both traits exist so the sync engine can
//! be exercised against in-memory clusters; [`ClusterRegistry`] and
//! [`ClusterConnection`] are the implementations backed by `kube`.

use crate::backoff::FibonacciBackoff;
use crate::error::InventoryError;
use crate::registry::{ClusterContext, ClusterRegistry};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod, Service};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{ListParams, ObjectList};
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout for connecting to the API server
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading API responses
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum attempts per page for transient failures
const MAX_ATTEMPTS: u32 = 3;

/// Page size for list requests
const PAGE_SIZE: u32 = 500;

/// Status the API server returns for invalid or expired credentials
const UNAUTHORIZED: u16 = 401;

/// Lists live objects from one cluster.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClient: Send + Sync {
    /// Context this client was opened for
    fn context(&self) -> &ClusterContext;

    /// Reported API server version (`gitVersion`)
    async fn server_version(&self) -> Result<String, InventoryError>;

    /// Number of node objects
    async fn count_nodes(&self) -> Result<i64, InventoryError>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, InventoryError>;
    async fn list_pods(&self) -> Result<Vec<Pod>, InventoryError>;
    async fn list_deployments(&self) -> Result<Vec<Deployment>, InventoryError>;
    async fn list_services(&self) -> Result<Vec<Service>, InventoryError>;
    async fn list_crds(&self) -> Result<Vec<CustomResourceDefinition>, InventoryError>;
}

/// Source of cluster connections.
#[async_trait::async_trait]
pub trait ClusterSource: Send + Sync {
    /// All contexts that could be synced
    fn contexts(&self) -> Result<Vec<ClusterContext>, InventoryError>;

    /// Open a connection, failing with [`InventoryError::Connection`] when
    /// the cluster is unreachable or rejects the credentials.
    async fn connect(&self, context: &ClusterContext) -> Result<Box<dyn ClusterClient>, InventoryError>;
}

/// A live connection to one cluster.
pub struct ClusterConnection {
    context: ClusterContext,
    client: Client,
    /// Version read while probing the connection, `None` when the server refused it
    version: Option<String>,
}

impl Debug for ClusterConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterConnection")
            .field("context", &self.context)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ClusterSource for ClusterRegistry {
    fn contexts(&self) -> Result<Vec<ClusterContext>, InventoryError> {
        self.list_contexts()
    }

    async fn connect(&self, context: &ClusterContext) -> Result<Box<dyn ClusterClient>, InventoryError> {
        let connection_error = |message: String| InventoryError::Connection {
            context: context.name.clone(),
            message,
        };

        let mut config = Config::from_custom_kubeconfig(
            self.kubeconfig.clone(),
            &KubeConfigOptions {
                context: Some(context.name.clone()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| connection_error(format!("failed to load kubeconfig: {e}")))?;

        config.connect_timeout = Some(CONNECT_TIMEOUT);
        config.read_timeout = Some(READ_TIMEOUT);

        let mut context = context.clone();
        if context.server.is_empty() {
            context.server = config.cluster_url.to_string();
        }

        let client = Client::try_from(config)
            .map_err(|e| connection_error(format!("failed to create client: {e}")))?;

        // Probe reachability. A refusal other than 401 still proves the
        // server answered with usable credentials.
        let version = match client.apiserver_version().await {
            Ok(info) => Some(info.git_version),
            Err(kube::Error::Api(e)) if rejects_credentials(e.code) => {
                return Err(connection_error(format!("credentials rejected: {}", e.message)));
            }
            Err(kube::Error::Api(e)) => {
                debug!(context = %context.name, code = e.code, "Server version refused");
                None
            }
            Err(e) => return Err(connection_error(e.to_string())),
        };

        debug!(context = %context.name, server = %context.server, "Connected");
        Ok(Box::new(ClusterConnection { context, client, version }))
    }
}

impl ClusterConnection {
    /// List every object of `K` across all namespaces.
    async fn list_all<K>(&self, resource: &'static str) -> Result<Vec<K>, InventoryError>
    where
        K: kube::Resource + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        self.paged(resource, |params| {
            let api = api.clone();
            async move { api.list(&params).await }
        })
        .await
    }

    /// Fetch every page, retrying each page on transient errors.
    async fn paged<T, F, Fut>(&self, resource: &'static str, mut fetch: F) -> Result<Vec<T>, InventoryError>
    where
        T: Clone,
        F: FnMut(ListParams) -> Fut,
        Fut: Future<Output = Result<ObjectList<T>, kube::Error>>,
    {
        let context = self.context.name.as_str();
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;
        let mut pages = 0u32;
        let mut backoff = FibonacciBackoff::new(Duration::from_millis(100), Duration::from_secs(2));

        loop {
            let mut params = ListParams::default().limit(PAGE_SIZE);
            if let Some(token) = &continue_token {
                params = params.continue_token(token);
            }

            let mut attempt = 1;
            let list = loop {
                match fetch(params.clone()).await {
                    Ok(list) => break list,
                    Err(e) if attempt < MAX_ATTEMPTS && is_retryable(&e) => {
                        let delay = backoff.next_backoff();
                        warn!(
                            resource,
                            context,
                            attempt,
                            max_attempts = MAX_ATTEMPTS,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %e,
                            "Retryable error, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        return Err(InventoryError::Fetch {
                            resource,
                            message: e.to_string(),
                        });
                    }
                }
            };

            backoff.reset();
            pages += 1;
            items.extend(list.items);

            match list.metadata.continue_ {
                Some(token) if !token.is_empty() => continue_token = Some(token),
                _ => break,
            }
        }

        if pages > 1 {
            debug!(resource, context, pages, total = items.len(), "Pagination complete");
        }
        Ok(items)
    }
}

/// Whether a status from the version probe means the credentials are invalid.
fn rejects_credentials(code: u16) -> bool {
    code == UNAUTHORIZED
}

/// Transient failures worth retrying: transport errors, 429, 503 and 504.
fn is_retryable(err: &kube::Error) -> bool {
    match err {
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        kube::Error::Api(api_err) => matches!(api_err.code, 429 | 503 | 504),
        _ => false,
    }
}

#[async_trait::async_trait]
impl ClusterClient for ClusterConnection {
    fn context(&self) -> &ClusterContext {
        &self.context
    }

    async fn server_version(&self) -> Result<String, InventoryError> {
        self.version.clone().ok_or_else(|| InventoryError::Unavailable {
            field: "kubernetes_version",
            message: "server refused the version request".to_string(),
        })
    }

    async fn count_nodes(&self) -> Result<i64, InventoryError> {
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = self
            .paged("nodes", |params| {
                let api = api.clone();
                async move { api.list_metadata(&params).await }
            })
            .await
            .map_err(|e| InventoryError::Unavailable {
                field: "node_count",
                message: e.to_string(),
            })?;
        Ok(i64::try_from(nodes.len()).unwrap_or(i64::MAX))
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, InventoryError> {
        self.list_all("namespaces").await
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, InventoryError> {
        self.list_all("pods").await
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, InventoryError> {
        self.list_all("deployments").await
    }

    async fn list_services(&self) -> Result<Vec<Service>, InventoryError> {
        self.list_all("services").await
    }

    async fn list_crds(&self) -> Result<Vec<CustomResourceDefinition>, InventoryError> {
        self.list_all("customresourcedefinitions").await
    }
}
