//! Inventory Model
//!
//! Types shared by every part of the Kubernetes inventory sync:
//! - `ResourceKind`: the closed set of kinds that can be synced
//! - Canonical rows projected from live cluster objects
//! - Persisted records keyed by cluster identity
//! - Table definitions announced to a plugin host

pub mod identity;
pub mod kind;
pub mod records;
pub mod tables;

pub use identity::cluster_uid;
pub use kind::{ResourceKind, UnknownKind};
pub use records::*;
pub use tables::{Column, ColumnType, TableDefinition};
