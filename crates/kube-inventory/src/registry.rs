//! Cluster registry backed by kubeconfig.
//!
//! Discovery is read-only: contexts are described from the parsed
//! kubeconfig without contacting any cluster. Connecting happens per
//! context through [`ClusterSource::connect`](crate::ClusterSource::connect),
//! so one stale context never hides the others.

use crate::error::InventoryError;
use kube::config::{Kubeconfig, NamedContext};
use std::path::Path;
use tracing::debug;

/// Namespace used when a context does not set one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Connection parameters of one kubeconfig context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterContext {
    /// Context name (local alias)
    pub name: String,
    /// Cluster entry name, falls back to the context name
    pub cluster_name: String,
    /// API server endpoint, empty when the cluster entry has none
    pub server: String,
    /// Default namespace
    pub namespace: String,
    /// CA bundle path, empty when not configured
    pub ca_file: String,
    /// Whether TLS verification is skipped
    pub insecure_skip_verify: bool,
}

/// Enumerates configured contexts.
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    pub(crate) kubeconfig: Kubeconfig,
}

impl ClusterRegistry {
    /// Load kubeconfig from `path`, or from `KUBECONFIG` / `~/.kube/config` when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, InventoryError> {
        let kubeconfig = match path {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        }
        .map_err(|e| InventoryError::Configuration(format!("no usable kubeconfig: {e}")))?;

        debug!("Loaded kubeconfig with {} contexts", kubeconfig.contexts.len());
        Ok(Self::from_kubeconfig(kubeconfig))
    }

    /// Parse a kubeconfig document.
    pub fn from_yaml(text: &str) -> Result<Self, InventoryError> {
        Kubeconfig::from_yaml(text)
            .map(Self::from_kubeconfig)
            .map_err(|e| InventoryError::Configuration(format!("invalid kubeconfig: {e}")))
    }

    /// Wrap an already-loaded kubeconfig.
    #[must_use]
    pub fn from_kubeconfig(kubeconfig: Kubeconfig) -> Self {
        Self { kubeconfig }
    }

    /// Describe every context.
    ///
    /// Fails with [`InventoryError::Configuration`] when kubeconfig defines
    /// no contexts at all.
    pub fn list_contexts(&self) -> Result<Vec<ClusterContext>, InventoryError> {
        if self.kubeconfig.contexts.is_empty() {
            return Err(InventoryError::Configuration(
                "kubeconfig defines no contexts".to_string(),
            ));
        }
        Ok(self.kubeconfig.contexts.iter().map(|c| self.describe(c)).collect())
    }

    /// Describe the named context, or the current context when `name` is empty.
    pub fn resolve(&self, name: &str) -> Result<ClusterContext, InventoryError> {
        let name = if name.is_empty() {
            self.kubeconfig.current_context.as_deref().unwrap_or_default()
        } else {
            name
        };

        self.kubeconfig
            .contexts
            .iter()
            .find(|c| c.name == name)
            .map(|c| self.describe(c))
            .ok_or_else(|| InventoryError::NotFound(format!("context '{name}' not found in kubeconfig")))
    }

    fn describe(&self, named: &NamedContext) -> ClusterContext {
        let context = named.context.as_ref();
        let cluster_ref = context.map(|c| c.cluster.as_str()).unwrap_or_default();
        let cluster = self
            .kubeconfig
            .clusters
            .iter()
            .find(|c| c.name == cluster_ref)
            .and_then(|c| c.cluster.as_ref());

        let cluster_name = if cluster_ref.is_empty() {
            named.name.clone()
        } else {
            cluster_ref.to_string()
        };
        let namespace = context
            .and_then(|c| c.namespace.clone())
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        ClusterContext {
            name: named.name.clone(),
            cluster_name,
            server: cluster.and_then(|c| c.server.clone()).unwrap_or_default(),
            namespace,
            ca_file: cluster
                .and_then(|c| c.certificate_authority.clone())
                .unwrap_or_default(),
            insecure_skip_verify: cluster
                .and_then(|c| c.insecure_skip_tls_verify)
                .unwrap_or(false),
        }
    }
}
