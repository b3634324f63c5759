//! Cluster identity derivation.
//!
//! A cluster is identified by its API endpoint, never by the local context
//! name, so two kubeconfig aliases for the same control-plane collapse into
//! a single cluster row.

use sha2::{Digest, Sha256};

/// Derives the stable cluster identity for an API server endpoint.
///
/// Surrounding whitespace and trailing slashes are ignored; everything else
/// (scheme, host, port, path) is significant. The result is the lowercase
/// hex SHA-256 of the normalized endpoint.
#[must_use]
pub fn cluster_uid(server: &str) -> String {
    let normalized = server.trim().trim_end_matches('/');

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}
