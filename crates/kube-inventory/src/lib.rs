//! Kubernetes Inventory Client
//!
//! Discovers clusters from kubeconfig and lists live objects from each of
//! them, projecting every object into a canonical inventory row.
//!
//! # Example
//!
//! ```no_run
//! use kube_inventory::{ClusterRegistry, ClusterSource, provider_for};
//! use inventory_model::ResourceKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ClusterRegistry::load(None)?;
//! let context = registry.resolve("prod")?;
//! let client = registry.connect(&context).await?;
//!
//! if let Some(provider) = provider_for(ResourceKind::Pod) {
//!     let rows = provider.list(client.as_ref()).await?;
//!     println!("{} pods in {}", rows.len(), context.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Registry**: kubeconfig contexts with their endpoint, namespace and TLS settings
//! - **Providers**: one per kind, looked up through [`provider_for`]
//! - **Paging and retries**: list calls page with continue tokens and back off on transient errors
//! - **test-util**: in-memory [`MockClusterSource`] for reconciler tests

pub mod backoff;
pub mod client;
pub mod error;
pub mod providers;
pub mod registry;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{ClusterClient, ClusterConnection, ClusterSource};
pub use error::InventoryError;
pub use providers::cluster_info::{ClusterInfoReport, DegradedRead};
pub use providers::{ResourceProvider, provider_for};
pub use registry::{ClusterContext, ClusterRegistry};
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockClusterClient, MockClusterSource};
