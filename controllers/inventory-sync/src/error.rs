//! Sync error taxonomy.
//!
//! Configuration errors, an unreachable store and a closed event sink end
//! a run. Every other variant is recorded against its context (and kind)
//! and the run moves on.

use inventory_model::ResourceKind;
use inventory_store::StoreError;
use kube_inventory::InventoryError;
use thiserror::Error;

/// Errors that can occur during an inventory sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid run configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A cluster is unreachable or rejected its credentials
    #[error("Failed to connect to context '{context}': {message}")]
    Connection { context: String, message: String },

    /// Listing one kind from one cluster failed
    #[error("Failed to fetch {kind} from context '{context}': {message}")]
    TransientFetch {
        context: String,
        kind: ResourceKind,
        message: String,
    },

    /// A best-effort field fell back to its default
    #[error("Degraded read of {field} on context '{context}': {message}")]
    DegradedRead {
        context: String,
        field: &'static str,
        message: String,
    },

    /// A store write or schema setup failed, or the store is unreachable
    #[error("Store error: {0}")]
    Persistence(#[from] StoreError),

    /// The event stream receiver went away
    #[error("Event sink closed")]
    SinkClosed,
}

/// Error class recorded in a [`crate::report::SyncReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Connection,
    TransientFetch,
    DegradedRead,
    Persistence,
    StoreUnavailable,
    SinkClosed,
}

impl SyncError {
    /// Class of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            SyncError::Configuration(_) => ErrorClass::Configuration,
            SyncError::Connection { .. } => ErrorClass::Connection,
            SyncError::TransientFetch { .. } => ErrorClass::TransientFetch,
            SyncError::DegradedRead { .. } => ErrorClass::DegradedRead,
            SyncError::Persistence(e) if e.is_unavailable() => ErrorClass::StoreUnavailable,
            SyncError::Persistence(_) => ErrorClass::Persistence,
            SyncError::SinkClosed => ErrorClass::SinkClosed,
        }
    }

    /// Whether this error ends the run
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Configuration(_) | SyncError::SinkClosed => true,
            SyncError::Persistence(e) => e.is_unavailable(),
            _ => false,
        }
    }

    /// Map a client error raised while syncing `context`.
    ///
    /// `kind` is the kind being listed, `None` while connecting.
    pub fn from_inventory(context: &str, kind: Option<ResourceKind>, err: InventoryError) -> Self {
        match (err, kind) {
            (InventoryError::Configuration(message) | InventoryError::NotFound(message), _) => {
                SyncError::Configuration(message)
            }
            (InventoryError::Unavailable { field, message }, _) => SyncError::DegradedRead {
                context: context.to_string(),
                field,
                message,
            },
            (InventoryError::Fetch { message, .. }, Some(kind)) => SyncError::TransientFetch {
                context: context.to_string(),
                kind,
                message,
            },
            (err, Some(kind)) => SyncError::TransientFetch {
                context: context.to_string(),
                kind,
                message: err.to_string(),
            },
            (InventoryError::Connection { message, .. }, None) => SyncError::Connection {
                context: context.to_string(),
                message,
            },
            (err, None) => SyncError::Connection {
                context: context.to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Registry failures before any cluster is contacted are configuration errors.
impl From<InventoryError> for SyncError {
    fn from(err: InventoryError) -> Self {
        SyncError::Configuration(err.to_string())
    }
}
