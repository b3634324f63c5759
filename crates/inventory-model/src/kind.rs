//! Resource kinds known to the inventory sync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A category of cluster object that can be inventoried.
///
/// `ClusterInfo` is synthetic: it aggregates context metadata, the API
/// server version and a node count instead of listing one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Cluster metadata (one row per cluster)
    ClusterInfo,
    /// Namespaces
    Namespace,
    /// Pods across all namespaces
    Pod,
    /// Deployments across all namespaces
    Deployment,
    /// Services across all namespaces
    Service,
    /// CustomResourceDefinitions
    CustomResourceDefinition,
}

/// Returned when a resource selector names no known kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown resource kind '{0}'")]
pub struct UnknownKind(pub String);

impl ResourceKind {
    /// Every kind, cluster-info first.
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::ClusterInfo,
        ResourceKind::Namespace,
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::Service,
        ResourceKind::CustomResourceDefinition,
    ];

    /// Kinds that reference a cluster row and are listed by a provider.
    pub const RESOURCES: [ResourceKind; 5] = [
        ResourceKind::Namespace,
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::Service,
        ResourceKind::CustomResourceDefinition,
    ];

    /// Name used in resource selectors (`K8S_RESOURCES`, `resources:`).
    #[must_use]
    pub fn selector_name(self) -> &'static str {
        match self {
            ResourceKind::ClusterInfo => "clusters",
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Pod => "pods",
            ResourceKind::Deployment => "deployments",
            ResourceKind::Service => "services",
            ResourceKind::CustomResourceDefinition => "crds",
        }
    }

    /// Name of the table this kind lands in.
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            ResourceKind::ClusterInfo => "k8s_clusters",
            ResourceKind::Namespace => "k8s_namespaces",
            ResourceKind::Pod => "k8s_pods",
            ResourceKind::Deployment => "k8s_deployments",
            ResourceKind::Service => "k8s_services",
            ResourceKind::CustomResourceDefinition => "k8s_crds",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector_name())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clusters" | "cluster" | "cluster-info" | "k8s_clusters" => Ok(ResourceKind::ClusterInfo),
            "namespaces" | "namespace" | "k8s_namespaces" => Ok(ResourceKind::Namespace),
            "pods" | "pod" | "k8s_pods" => Ok(ResourceKind::Pod),
            "deployments" | "deployment" | "k8s_deployments" => Ok(ResourceKind::Deployment),
            "services" | "service" | "k8s_services" => Ok(ResourceKind::Service),
            "crds" | "crd" | "customresourcedefinitions" | "custom-resource-definitions"
            | "k8s_crds" => Ok(ResourceKind::CustomResourceDefinition),
            _ => Err(UnknownKind(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.selector_name().parse::<ResourceKind>(), Ok(kind));
            assert_eq!(kind.table_name().parse::<ResourceKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_parse_aliases_case_insensitive() {
        assert_eq!(" Pods ".parse(), Ok(ResourceKind::Pod));
        assert_eq!("CustomResourceDefinitions".parse(), Ok(ResourceKind::CustomResourceDefinition));
        assert_eq!("cluster-info".parse(), Ok(ResourceKind::ClusterInfo));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            "configmaps".parse::<ResourceKind>(),
            Err(UnknownKind("configmaps".to_string()))
        );
    }

    #[test]
    fn test_cluster_info_is_first() {
        assert_eq!(ResourceKind::ALL[0], ResourceKind::ClusterInfo);
        assert!(!ResourceKind::RESOURCES.contains(&ResourceKind::ClusterInfo));
    }
}
