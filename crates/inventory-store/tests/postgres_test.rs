//! Integration tests for the PostgreSQL store
//!
//! These tests require a running PostgreSQL instance.
//! Set DATABASE_URL to run. Each test uses its own cluster identity so
//! they can share one database.

use chrono::{DateTime, Utc};
use inventory_model::{ClusterInfo, ClusterRecord, DeploymentRow, PodRow, ResourceRow, cluster_uid};
use inventory_store::{InventoryStore, PgStore, StoreError};
use sqlx::PgPool;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");
    let store = PgStore::connect(&url).await.expect("Failed to connect");
    store.ensure_schema().await.expect("Failed to create schema");
    store
}

/// Store plus a second handle on the same pool for reading rows back.
async fn store_with_pool() -> (PgStore, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable must be set");
    let pool = PgPool::connect(&url).await.expect("Failed to connect");
    let store = PgStore::from_pool(pool.clone());
    store.ensure_schema().await.expect("Failed to create schema");
    (store, pool)
}

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).expect("valid timestamp")
}

fn cluster(server: &str, context: &str, synced_at: DateTime<Utc>) -> ClusterRecord {
    ClusterRecord {
        cluster_uid: cluster_uid(server),
        context_name: context.to_string(),
        info: ClusterInfo {
            name: context.to_string(),
            server: server.to_string(),
            ca_file: String::new(),
            insecure_skip_verify: false,
            namespace: "default".to_string(),
            kubernetes_version: "v1.30.0".to_string(),
            node_count: 3,
        },
        synced_at,
    }
}

fn pod(uid: &str, name: &str) -> ResourceRow {
    pod_in_phase(uid, name, "Running")
}

fn pod_in_phase(uid: &str, name: &str, phase: &str) -> ResourceRow {
    ResourceRow::Pod(PodRow {
        uid: uid.to_string(),
        namespace: "default".to_string(),
        name: name.to_string(),
        status: phase.to_string(),
        created_at: at(1_700_000_000),
    })
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn test_ensure_schema_is_idempotent() {
    let store = store().await;
    store.ensure_schema().await.expect("Second schema run failed");
}

#[tokio::test]
#[ignore]
async fn test_upsert_cluster_twice_keeps_created_at() {
    let (store, pool) = store_with_pool().await;
    let first = cluster("https://it-cluster-first-seen.example.com:6443", "it-a", at(1_700_000_000));
    let mut second = cluster("https://it-cluster-first-seen.example.com:6443", "it-a-alias", at(1_700_000_600));
    second.info.kubernetes_version = "v1.31.1".to_string();
    second.info.node_count = 5;

    store.upsert_cluster(&first).await.expect("First upsert failed");
    store.upsert_cluster(&second).await.expect("Second upsert failed");

    let (context_name, version, nodes, created_at, synced_at, updated_at): (
        String,
        String,
        i64,
        DateTime<Utc>,
        DateTime<Utc>,
        DateTime<Utc>,
    ) = sqlx::query_as(
        "SELECT context_name, kubernetes_version, node_count, created_at, synced_at, updated_at \
         FROM k8s_clusters WHERE cluster_uid = $1",
    )
    .bind(&first.cluster_uid)
    .fetch_one(&pool)
    .await
    .expect("Cluster row missing");

    assert_eq!(context_name, "it-a-alias");
    assert_eq!(version, "v1.31.1");
    assert_eq!(nodes, 5);
    assert_eq!(created_at, at(1_700_000_000));
    assert_eq!(synced_at, at(1_700_000_600));
    assert_eq!(updated_at, at(1_700_000_600));
}

#[tokio::test]
#[ignore]
async fn test_upsert_overwrites_changed_columns() {
    let (store, pool) = store_with_pool().await;
    let record = cluster("https://it-overwrite.example.com:6443", "it-c", Utc::now());
    store.upsert_cluster(&record).await.expect("Cluster upsert failed");

    store
        .upsert_resources(&record.cluster_uid, "it-c", &[pod_in_phase("it-ow-1", "job-0", "Pending")])
        .await
        .expect("First upsert failed");
    store
        .upsert_resources(&record.cluster_uid, "it-c", &[pod_in_phase("it-ow-1", "job-0", "Succeeded")])
        .await
        .expect("Second upsert failed");

    let rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM k8s_pods WHERE cluster_uid = $1 AND uid = $2")
        .bind(&record.cluster_uid)
        .bind("it-ow-1")
        .fetch_all(&pool)
        .await
        .expect("Pod query failed");
    assert_eq!(rows, vec![("Succeeded".to_string(),)]);
}

#[tokio::test]
#[ignore]
async fn test_upsert_resources_in_one_transaction() {
    let store = store().await;
    let record = cluster("https://it-resources.example.com:6443", "it-b", Utc::now());
    store.upsert_cluster(&record).await.expect("Cluster upsert failed");

    let rows = vec![
        pod("it-pod-1", "web-0"),
        pod("it-pod-2", "web-1"),
        ResourceRow::Deployment(DeploymentRow {
            uid: "it-deploy-1".to_string(),
            namespace: "default".to_string(),
            name: "web".to_string(),
            replicas: 2,
            ready: 2,
            created_at: Utc::now(),
        }),
    ];

    let written = store
        .upsert_resources(&record.cluster_uid, &record.context_name, &rows)
        .await
        .expect("Resource upsert failed");
    assert_eq!(written, 3);

    let again = store
        .upsert_resources(&record.cluster_uid, &record.context_name, &rows)
        .await
        .expect("Repeat upsert failed");
    assert_eq!(again, 3);
}

#[tokio::test]
#[ignore]
async fn test_resources_without_cluster_are_rejected() {
    let store = store().await;
    let result = store
        .upsert_resources(&cluster_uid("https://never-recorded.example.com"), "ghost", &[pod("ghost-1", "ghost")])
        .await;
    assert!(matches!(result, Err(StoreError::MissingCluster(_))));
}
