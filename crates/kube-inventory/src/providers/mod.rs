//! Resource providers.
//!
//! One provider per listed kind, each projecting live objects into the
//! canonical row for its kind. Cluster info is not a provider: it is an
//! aggregation with best-effort fields, see [`cluster_info::collect`].

pub mod cluster_info;
mod crds;
mod deployments;
mod namespaces;
mod pods;
mod services;

pub use crds::CrdProvider;
pub use deployments::DeploymentProvider;
pub use namespaces::NamespaceProvider;
pub use pods::PodProvider;
pub use services::ServiceProvider;

use crate::client::ClusterClient;
use crate::error::InventoryError;
use chrono::{DateTime, Utc};
use inventory_model::{ResourceKind, ResourceRow};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

/// Lists one kind from a cluster and projects it into rows.
#[async_trait::async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Kind this provider lists
    fn kind(&self) -> ResourceKind;

    /// List every object of the kind.
    ///
    /// The listing completes before any row is returned, so callers never
    /// see a partial kind.
    async fn list(&self, client: &dyn ClusterClient) -> Result<Vec<ResourceRow>, InventoryError>;
}

static NAMESPACES: NamespaceProvider = NamespaceProvider;
static PODS: PodProvider = PodProvider;
static DEPLOYMENTS: DeploymentProvider = DeploymentProvider;
static SERVICES: ServiceProvider = ServiceProvider;
static CRDS: CrdProvider = CrdProvider;

/// Provider for `kind`; `None` for the synthetic cluster-info kind.
#[must_use]
pub fn provider_for(kind: ResourceKind) -> Option<&'static dyn ResourceProvider> {
    match kind {
        ResourceKind::ClusterInfo => None,
        ResourceKind::Namespace => Some(&NAMESPACES),
        ResourceKind::Pod => Some(&PODS),
        ResourceKind::Deployment => Some(&DEPLOYMENTS),
        ResourceKind::Service => Some(&SERVICES),
        ResourceKind::CustomResourceDefinition => Some(&CRDS),
    }
}

/// Identity fields shared by every object.
pub(crate) struct Meta {
    pub uid: String,
    pub name: String,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}

impl Meta {
    pub(crate) fn of(meta: &ObjectMeta) -> Self {
        Self {
            uid: meta.uid.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            created_at: timestamp(meta.creation_timestamp.as_ref()),
        }
    }
}

/// Convert an API timestamp; a missing one maps to the Unix epoch.
pub(crate) fn timestamp(time: Option<&Time>) -> DateTime<Utc> {
    time.and_then(|t| {
        let nanos = u32::try_from(t.0.timestamp_subsec_nanos()).unwrap_or(0);
        DateTime::from_timestamp(t.0.timestamp(), nanos)
    })
    .unwrap_or_default()
}
