//! Run configuration.
//!
//! A JSON or YAML payload (from the file named by `INVENTORY_CONFIG`)
//! completed by environment variables. Payload values win; the
//! environment only fills fields the payload leaves out.

use crate::error::SyncError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "INVENTORY_CONFIG";

/// Where synced rows go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Upsert into PostgreSQL
    #[default]
    Store,
    /// Emit table definitions and inserts as JSON lines
    Events,
}

impl FromStr for SinkKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" | "postgres" => Ok(SinkKind::Store),
            "events" => Ok(SinkKind::Events),
            other => Err(SyncError::Configuration(format!("unknown sink '{other}'"))),
        }
    }
}

/// Raw run configuration.
///
/// `None` means the field was not given; `Some(vec![])` means it was given
/// empty. Both select everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub database_url: Option<String>,
    pub contexts: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
    /// Host table allow-list (globs)
    pub tables: Option<Vec<String>>,
    /// Host table deny-list (globs)
    pub skip_tables: Option<Vec<String>>,
    pub sink: Option<SinkKind>,
    /// Explicit kubeconfig path, otherwise the usual discovery applies
    pub kubeconfig: Option<PathBuf>,
}

impl SyncConfig {
    /// Parse a payload, trying JSON first and YAML second.
    pub fn parse(payload: &str) -> Result<Self, SyncError> {
        serde_json::from_str(payload).or_else(|_| {
            serde_yaml::from_str(payload)
                .map_err(|e| SyncError::Configuration(format!("failed to parse configuration: {e}")))
        })
    }

    /// Load the payload named by `INVENTORY_CONFIG` (if any) and apply the
    /// environment fallback. `env` looks up one variable.
    pub fn load<F>(env: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = match env(CONFIG_PATH_ENV) {
            Some(path) => Self::read(Path::new(&path))?,
            None => Self::default(),
        };
        config.with_env_fallback(env)
    }

    fn read(path: &Path) -> Result<Self, SyncError> {
        let payload = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&payload)
    }

    /// Fill every field the payload left out from the environment.
    pub fn with_env_fallback<F>(mut self, env: F) -> Result<Self, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let list = |key: &str| env(key).map(|raw| parse_list(&raw));

        if self.database_url.is_none() {
            self.database_url = env("DATABASE_URL").filter(|url| !url.trim().is_empty());
        }
        if self.contexts.is_none() {
            self.contexts = list("K8S_CONTEXTS");
        }
        if self.resources.is_none() {
            self.resources = list("K8S_RESOURCES");
        }
        if self.tables.is_none() {
            self.tables = list("SYNC_TABLES");
        }
        if self.skip_tables.is_none() {
            self.skip_tables = list("SYNC_SKIP_TABLES");
        }
        if self.sink.is_none() {
            self.sink = env("SYNC_SINK").map(|raw| raw.parse()).transpose()?;
        }
        Ok(self)
    }

    pub fn contexts(&self) -> &[String] {
        self.contexts.as_deref().unwrap_or_default()
    }

    pub fn resources(&self) -> &[String] {
        self.resources.as_deref().unwrap_or_default()
    }

    pub fn tables(&self) -> &[String] {
        self.tables.as_deref().unwrap_or_default()
    }

    pub fn skip_tables(&self) -> &[String] {
        self.skip_tables.as_deref().unwrap_or_default()
    }

    pub fn sink(&self) -> SinkKind {
        self.sink.unwrap_or_default()
    }

    /// Database URL, required by the store sink.
    pub fn database_url(&self) -> Result<&str, SyncError> {
        self.database_url.as_deref().ok_or_else(|| {
            SyncError::Configuration("database_url (or DATABASE_URL) is required for the store sink".to_string())
        })
    }
}

/// Split a comma-separated list, trimming items and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
