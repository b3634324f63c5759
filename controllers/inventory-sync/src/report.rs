//! Run diagnostics.

use crate::error::{ErrorClass, SyncError};
use inventory_model::ResourceKind;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A recoverable failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub context: String,
    /// Kind being synced, `None` when the whole cluster was skipped
    pub kind: Option<ResourceKind>,
    pub class: ErrorClass,
    pub message: String,
}

/// A best-effort field that fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedField {
    pub context: String,
    pub field: &'static str,
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub clusters_attempted: usize,
    /// Clusters that connected and were not skipped
    pub clusters_synced: usize,
    pub rows: BTreeMap<ResourceKind, usize>,
    pub failures: Vec<Failure>,
    pub degraded: Vec<DegradedField>,
}

impl SyncReport {
    pub(crate) fn add_rows(&mut self, kind: ResourceKind, count: usize) {
        *self.rows.entry(kind).or_default() += count;
    }

    pub(crate) fn record_failure(&mut self, context: &str, kind: Option<ResourceKind>, err: &SyncError) {
        self.failures.push(Failure {
            context: context.to_string(),
            kind,
            class: err.class(),
            message: err.to_string(),
        });
    }

    /// Record a [`SyncError::DegradedRead`]; other errors are ignored.
    pub(crate) fn record_degraded(&mut self, err: &SyncError) {
        if let SyncError::DegradedRead { context, field, .. } = err {
            self.degraded.push(DegradedField {
                context: context.clone(),
                field: *field,
                message: err.to_string(),
            });
        }
    }

    /// Log a one-line summary plus each failure
    pub fn log_summary(&self) {
        let rows: Vec<String> = self.rows.iter().map(|(k, n)| format!("{k}={n}")).collect();
        info!(
            clusters_attempted = self.clusters_attempted,
            clusters_synced = self.clusters_synced,
            rows = %rows.join(" "),
            failures = self.failures.len(),
            degraded = self.degraded.len(),
            "Sync complete"
        );
        for failure in &self.failures {
            warn!(
                context = %failure.context,
                kind = ?failure.kind,
                class = ?failure.class,
                error = %failure.message,
                "Recorded failure"
            );
        }
        for degraded in &self.degraded {
            info!(
                context = %degraded.context,
                field = degraded.field,
                error = %degraded.message,
                "Degraded read"
            );
        }
    }
}

#[cfg(test)]
impl SyncReport {
    /// Rows written for `kind`
    pub fn rows_for(&self, kind: ResourceKind) -> usize {
        self.rows.get(&kind).copied().unwrap_or(0)
    }

    /// Failures recorded for `context` (and `kind`, when given)
    pub fn failures_for(&self, context: &str, kind: Option<ResourceKind>) -> Vec<&Failure> {
        self.failures
            .iter()
            .filter(|f| f.context == context && (kind.is_none() || f.kind == kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_accumulate_per_kind() {
        let mut report = SyncReport::default();
        report.add_rows(ResourceKind::Pod, 5);
        report.add_rows(ResourceKind::Pod, 12);
        assert_eq!(report.rows_for(ResourceKind::Pod), 17);
        assert_eq!(report.rows_for(ResourceKind::Service), 0);
    }

    #[test]
    fn test_failures_filter_by_context_and_kind() {
        let mut report = SyncReport::default();
        let err = SyncError::TransientFetch {
            context: "prod".to_string(),
            kind: ResourceKind::Namespace,
            message: "forbidden".to_string(),
        };
        report.record_failure("prod", Some(ResourceKind::Namespace), &err);

        assert_eq!(report.failures_for("prod", None).len(), 1);
        assert_eq!(report.failures_for("prod", Some(ResourceKind::Namespace))[0].class, ErrorClass::TransientFetch);
        assert!(report.failures_for("prod", Some(ResourceKind::Pod)).is_empty());
        assert!(report.failures_for("dev", None).is_empty());
    }

    #[test]
    fn test_degraded_reads_kept_apart_from_failures() {
        let mut report = SyncReport::default();
        report.record_degraded(&SyncError::DegradedRead {
            context: "prod".to_string(),
            field: "node_count",
            message: "nodes is forbidden".to_string(),
        });
        report.record_degraded(&SyncError::SinkClosed);

        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].field, "node_count");
        assert!(report.degraded[0].message.contains("nodes is forbidden"));
        assert!(report.failures.is_empty());
    }
}
