//! SQL generation from table definitions.
//!
//! DDL and upsert statements are derived from [`TableDefinition`], so the
//! tables announced to a plugin host and the tables written to Postgres
//! cannot drift apart, and every upsert has exactly one placeholder per
//! column.

use inventory_model::{ColumnType, ResourceKind, TableDefinition};

/// Columns the cluster upsert leaves untouched on conflict.
const CLUSTER_INSERT_ONLY: &[&str] = &["created_at"];

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::String => "TEXT",
        ColumnType::Bool => "BOOLEAN",
        ColumnType::Int64 => "BIGINT",
        ColumnType::Timestamp => "TIMESTAMPTZ",
    }
}

/// `CREATE TABLE IF NOT EXISTS` for one table.
#[must_use]
pub fn create_table(table: &TableDefinition) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", table.name);
    for column in &table.columns {
        let null = if column.primary_key || column.name != "context_name" {
            " NOT NULL"
        } else {
            ""
        };
        sql.push_str(&format!("    {} {}{},\n", column.name, sql_type(column.column_type), null));
    }
    sql.push_str(&format!("    PRIMARY KEY ({})", table.primary_key().join(", ")));
    if let Some(parent) = table.parent {
        sql.push_str(&format!(
            ",\n    FOREIGN KEY (cluster_uid) REFERENCES {parent}(cluster_uid) ON DELETE CASCADE"
        ));
    }
    sql.push_str("\n)");
    sql
}

/// `INSERT ... ON CONFLICT DO UPDATE` for one table.
///
/// Placeholders follow the column order of the definition.
#[must_use]
pub fn upsert(table: &TableDefinition) -> String {
    let names: Vec<&str> = table.columns.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("${i}")).collect();

    let updates: Vec<String> = table
        .columns
        .iter()
        .filter(|c| !c.primary_key)
        .filter(|c| !(table.kind == ResourceKind::ClusterInfo && CLUSTER_INSERT_ONLY.contains(&c.name)))
        .map(|c| format!("{0} = EXCLUDED.{0}", c.name))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
        table.name,
        names.join(", "),
        placeholders.join(", "),
        table.primary_key().join(", "),
        updates.join(", "),
    )
}

/// DDL for every table, parent first.
#[must_use]
pub fn statements() -> Vec<(&'static str, String)> {
    TableDefinition::all()
        .iter()
        .map(|table| (table.name, create_table(table)))
        .collect()
}
