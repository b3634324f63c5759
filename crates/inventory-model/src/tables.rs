//! Table definitions announced to a plugin host before any rows are sent.

use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Bool,
    Int64,
    Timestamp,
}

/// A single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub primary_key: bool,
}

/// Schema of one inventory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: &'static str,
    pub kind: ResourceKind,
    pub columns: Vec<Column>,
    /// Table whose rows this one references (and is removed with)
    pub parent: Option<&'static str>,
}

const fn key(name: &'static str, column_type: ColumnType) -> Column {
    Column { name, column_type, primary_key: true }
}

const fn col(name: &'static str, column_type: ColumnType) -> Column {
    Column { name, column_type, primary_key: false }
}

impl TableDefinition {
    /// Definition of the table `kind` lands in.
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        use ColumnType::{Bool, Int64, String, Timestamp};

        let mut columns = match kind {
            ResourceKind::ClusterInfo => {
                return Self {
                    name: kind.table_name(),
                    kind,
                    parent: None,
                    columns: vec![
                        key("cluster_uid", String),
                        col("context_name", String),
                        col("cluster_name", String),
                        col("server", String),
                        col("ca_file", String),
                        col("insecure_skip_verify", Bool),
                        col("namespace", String),
                        col("kubernetes_version", String),
                        col("node_count", Int64),
                        col("synced_at", Timestamp),
                        col("created_at", Timestamp),
                        col("updated_at", Timestamp),
                    ],
                };
            }
            _ => vec![key("cluster_uid", String), col("context_name", String), key("uid", String)],
        };

        columns.extend(match kind {
            ResourceKind::Namespace => vec![col("name", String), col("status", String)],
            ResourceKind::Pod => vec![
                col("namespace", String),
                col("name", String),
                col("status", String),
            ],
            ResourceKind::Deployment => vec![
                col("namespace", String),
                col("name", String),
                col("replicas", Int64),
                col("ready", Int64),
            ],
            ResourceKind::Service => vec![
                col("namespace", String),
                col("name", String),
                col("type", String),
                col("cluster_ip", String),
            ],
            ResourceKind::CustomResourceDefinition => vec![
                col("name", String),
                col("group_name", String),
                col("kind", String),
                col("plural", String),
                col("scope", String),
            ],
            ResourceKind::ClusterInfo => Vec::new(),
        });
        columns.push(col("created_at", Timestamp));

        Self {
            name: kind.table_name(),
            kind,
            columns,
            parent: Some(ResourceKind::ClusterInfo.table_name()),
        }
    }

    /// All six tables, parent first.
    #[must_use]
    pub fn all() -> Vec<Self> {
        ResourceKind::ALL.into_iter().map(Self::for_kind).collect()
    }

    /// Names of the primary key columns, in order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&'static str> {
        self.columns.iter().filter(|c| c.primary_key).map(|c| c.name).collect()
    }
}
