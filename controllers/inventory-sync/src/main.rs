//! Kubernetes Inventory Sync
//!
//! Single-pass sync of live objects from every selected kubeconfig context
//! into the inventory tables:
//! - Cluster info: one row per API endpoint, shared by context aliases
//! - Namespaces, pods, deployments, services and CRDs: one row per object
//!
//! Rows go to PostgreSQL (`store` sink) or are printed as JSON lines for a
//! plugin host (`events` sink). Scheduling is left to the caller.

mod config;
mod error;
mod reconciler;
mod report;
mod selection;
mod sink;

use crate::config::{SinkKind, SyncConfig};
use crate::error::SyncError;
use crate::reconciler::Reconciler;
use crate::selection::SelectionConfig;
use crate::sink::{EventSink, StoreSink, SyncMessage};
use inventory_store::{InventoryStore, PgStore};
use kube_inventory::{ClusterRegistry, ClusterSource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Buffered messages between the reconciler and the JSON printer
const EVENT_BUFFER: usize = 100;

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure rustls crypto provider (use ring for compatibility)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting Kubernetes inventory sync");

    let config = SyncConfig::load(|key| std::env::var(key).ok())?;
    let registry = ClusterRegistry::load(config.kubeconfig.as_deref())?;
    let selection = SelectionConfig::resolve(&config, registry.contexts()?)?;

    info!("Configuration:");
    info!("  Contexts: {}", selection.contexts().iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "));
    info!("  Resources: {}", selection.kind_names().join(", "));
    info!("  Sink: {:?}", config.sink());

    let report = match config.sink() {
        SinkKind::Store => {
            let store = PgStore::connect(config.database_url()?).await?;
            let sink = StoreSink::new(Arc::new(store.clone()) as Arc<dyn InventoryStore>);
            let report = Reconciler::new(&registry, &sink, &selection).run().await;
            store.close().await;
            report?
        }
        SinkKind::Events => {
            let (tx, rx) = mpsc::channel(EVENT_BUFFER);
            let printer = tokio::spawn(print_events(rx));
            let sink = EventSink::new(tx);
            let report = Reconciler::new(&registry, &sink, &selection).run().await;
            drop(sink);
            if let Err(e) = printer.await {
                warn!(error = %e, "Event printer stopped unexpectedly");
            }
            report?
        }
    };

    if !report.failures.is_empty() {
        warn!(failures = report.failures.len(), "Sync finished with recorded failures");
    }
    Ok(())
}

/// Print each message as one JSON line on stdout.
async fn print_events(mut rx: mpsc::Receiver<SyncMessage>) {
    while let Some(message) = rx.recv().await {
        match serde_json::to_string(&message) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "Failed to encode sync message"),
        }
    }
}
