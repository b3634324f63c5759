//! PostgreSQL-backed inventory store.
//!
//! Uses a small `sqlx` pool. Each call to
//! [`InventoryStore::upsert_resources`] runs in its own transaction; a
//! failure part way through rolls the whole batch back when the
//! transaction is dropped.

use crate::error::StoreError;
use crate::schema;
use crate::InventoryStore;
use inventory_model::{ClusterRecord, ResourceKind, ResourceRow, TableDefinition};
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Maximum pooled connections
const MAX_CONNECTIONS: u32 = 5;

/// How long to wait for a pooled connection before failing
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLSTATE for a foreign key violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Inventory store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool for `database_url`.
    ///
    /// The URL may carry credentials and is never logged.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(database_url).map_err(StoreError::Connect)?;
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(StoreError::Connect)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl InventoryStore for PgStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        for (table, ddl) in schema::statements() {
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(|source| StoreError::Schema { table, source })?;
        }
        info!("Inventory schema ready");
        Ok(())
    }

    async fn upsert_cluster(&self, record: &ClusterRecord) -> Result<(), StoreError> {
        let sql = schema::upsert(&TableDefinition::for_kind(ResourceKind::ClusterInfo));
        let info = &record.info;

        sqlx::query(&sql)
            .bind(&record.cluster_uid)
            .bind(&record.context_name)
            .bind(&info.name)
            .bind(&info.server)
            .bind(&info.ca_file)
            .bind(info.insecure_skip_verify)
            .bind(&info.namespace)
            .bind(&info.kubernetes_version)
            .bind(info.node_count)
            .bind(record.synced_at)
            .bind(record.synced_at)
            .bind(record.synced_at)
            .execute(&self.pool)
            .await?;

        debug!(cluster_uid = %record.cluster_uid, context = %record.context_name, "Cluster upserted");
        Ok(())
    }

    async fn upsert_resources(
        &self,
        cluster_uid: &str,
        context_name: &str,
        rows: &[ResourceRow],
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut statements: BTreeMap<ResourceKind, String> = BTreeMap::new();
        for row in rows {
            statements
                .entry(row.kind())
                .or_insert_with(|| schema::upsert(&TableDefinition::for_kind(row.kind())));
        }

        let mut tx = self.pool.begin().await?;
        for row in rows {
            let Some(sql) = statements.get(&row.kind()) else {
                continue;
            };
            let query = sqlx::query(sql).bind(cluster_uid).bind(context_name);
            bind_row(query, row)
                .execute(&mut *tx)
                .await
                .map_err(|e| classify(e, cluster_uid))?;
        }
        tx.commit().await?;

        debug!(cluster_uid, context = context_name, rows = rows.len(), "Resources upserted");
        Ok(rows.len())
    }
}

/// Bind the kind-specific columns, in table column order after the key prefix.
fn bind_row<'q>(query: PgQuery<'q>, row: &'q ResourceRow) -> PgQuery<'q> {
    match row {
        ResourceRow::Namespace(r) => query.bind(&r.uid).bind(&r.name).bind(&r.status).bind(r.created_at),
        ResourceRow::Pod(r) => query
            .bind(&r.uid)
            .bind(&r.namespace)
            .bind(&r.name)
            .bind(&r.status)
            .bind(r.created_at),
        ResourceRow::Deployment(r) => query
            .bind(&r.uid)
            .bind(&r.namespace)
            .bind(&r.name)
            .bind(i64::from(r.replicas))
            .bind(i64::from(r.ready))
            .bind(r.created_at),
        ResourceRow::Service(r) => query
            .bind(&r.uid)
            .bind(&r.namespace)
            .bind(&r.name)
            .bind(&r.service_type)
            .bind(&r.cluster_ip)
            .bind(r.created_at),
        ResourceRow::CustomResourceDefinition(r) => query
            .bind(&r.uid)
            .bind(&r.name)
            .bind(&r.group)
            .bind(&r.kind)
            .bind(&r.plural)
            .bind(&r.scope)
            .bind(r.created_at),
    }
}

/// Map a row write failure, naming the cluster when its row is missing.
fn classify(err: sqlx::Error, cluster_uid: &str) -> StoreError {
    let missing_parent = matches!(
        &err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
    );
    if missing_parent {
        StoreError::MissingCluster(cluster_uid.to_string())
    } else {
        StoreError::from(err)
    }
}
