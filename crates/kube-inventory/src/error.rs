//! Inventory client errors

use thiserror::Error;

/// Errors that can occur while discovering or listing clusters
#[derive(Debug, Error)]
pub enum InventoryError {
    /// No usable credential source (kubeconfig missing, unreadable or empty)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Named context does not exist in kubeconfig
    #[error("Context not found: {0}")]
    NotFound(String),

    /// Cluster unreachable or its credentials rejected
    #[error("Failed to connect to context '{context}': {message}")]
    Connection {
        /// Context that failed
        context: String,
        /// Underlying cause
        message: String,
    },

    /// A list call failed after retries
    #[error("Failed to list {resource}: {message}")]
    Fetch {
        /// Resource being listed
        resource: &'static str,
        /// Underlying cause
        message: String,
    },

    /// Best-effort read that is not available (version, node count)
    #[error("Unavailable {field}: {message}")]
    Unavailable {
        /// Field that could not be read
        field: &'static str,
        /// Underlying cause
        message: String,
    },
}
