//! Helper functions for building Kubernetes objects in tests

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStatus};
use k8s_openapi::api::core::v1::{
    Namespace, NamespaceStatus, Pod, PodStatus, Service, ServiceSpec,
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

fn meta(uid: &str, namespace: Option<&str>, name: &str) -> ObjectMeta {
    ObjectMeta {
        uid: Some(uid.to_string()),
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    }
}

/// Build an `Active` namespace
pub fn namespace(uid: &str, name: &str) -> Namespace {
    Namespace {
        metadata: meta(uid, None, name),
        status: Some(NamespaceStatus {
            phase: Some("Active".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build a pod in `phase`
pub fn pod(uid: &str, namespace: &str, name: &str, phase: &str) -> Pod {
    Pod {
        metadata: meta(uid, Some(namespace), name),
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build a deployment with desired and ready replica counts
pub fn deployment(uid: &str, namespace: &str, name: &str, replicas: i32, ready: i32) -> Deployment {
    Deployment {
        metadata: meta(uid, Some(namespace), name),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            replicas: Some(replicas),
            ready_replicas: Some(ready),
            ..Default::default()
        }),
    }
}

/// Build a service
pub fn service(uid: &str, namespace: &str, name: &str, service_type: &str, cluster_ip: &str) -> Service {
    Service {
        metadata: meta(uid, Some(namespace), name),
        spec: Some(ServiceSpec {
            type_: Some(service_type.to_string()),
            cluster_ip: Some(cluster_ip.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build a CRD named `<plural>.<group>`
pub fn crd(uid: &str, group: &str, kind: &str, plural: &str, scope: &str) -> CustomResourceDefinition {
    CustomResourceDefinition {
        metadata: meta(uid, None, &format!("{plural}.{group}")),
        spec: CustomResourceDefinitionSpec {
            group: group.to_string(),
            names: CustomResourceDefinitionNames {
                kind: kind.to_string(),
                plural: plural.to_string(),
                ..Default::default()
            },
            scope: scope.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}
