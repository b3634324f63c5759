//! Selection filter.
//!
//! Resolves the contexts and kinds in scope for one run. An empty selector
//! selects everything. Kinds must also pass the host's table allow/deny
//! list. The result is immutable for the rest of the run.

use crate::config::SyncConfig;
use crate::error::SyncError;
use inventory_model::{ResourceKind, TableDefinition};
use kube_inventory::ClusterContext;
use std::collections::BTreeSet;
use tracing::warn;

/// Host-supplied table allow/deny list, matched with globs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    tables: Vec<String>,
    skip_tables: Vec<String>,
}

impl TableFilter {
    pub fn new(tables: &[String], skip_tables: &[String]) -> Self {
        Self {
            tables: tables.to_vec(),
            skip_tables: skip_tables.to_vec(),
        }
    }

    /// Whether `table` passes: allowed (or no allow-list) and not skipped.
    pub fn allows(&self, table: &str) -> bool {
        let allowed = self.tables.is_empty() || self.tables.iter().any(|p| glob_match(p, table));
        allowed && !self.skip_tables.iter().any(|p| glob_match(p, table))
    }
}

/// The contexts and kinds in scope for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    contexts: Vec<ClusterContext>,
    kinds: BTreeSet<ResourceKind>,
}

impl SelectionConfig {
    /// Resolve selectors from `config` against the `available` contexts.
    pub fn resolve(config: &SyncConfig, available: Vec<ClusterContext>) -> Result<Self, SyncError> {
        let filter = TableFilter::new(config.tables(), config.skip_tables());
        Ok(Self {
            contexts: select_contexts(config.contexts(), available)?,
            kinds: select_kinds(config.resources(), &filter)?,
        })
    }

    /// Contexts to sync, in kubeconfig order
    pub fn contexts(&self) -> &[ClusterContext] {
        &self.contexts
    }

    /// Whether the cluster table itself passed both filters
    pub fn records_clusters(&self) -> bool {
        self.kinds.contains(&ResourceKind::ClusterInfo)
    }

    /// Provider-listed kinds in scope, in table order
    pub fn resource_kinds(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.kinds.iter().copied().filter(|k| *k != ResourceKind::ClusterInfo)
    }

    /// Tables for every kind in scope, cluster table first when selected
    pub fn tables(&self) -> Vec<TableDefinition> {
        self.kinds.iter().map(|k| TableDefinition::for_kind(*k)).collect()
    }

    /// Selector names of the kinds in scope, for logging
    pub fn kind_names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|k| k.selector_name()).collect()
    }
}

/// Contexts matching any selector; every context when there are none.
fn select_contexts(selectors: &[String], available: Vec<ClusterContext>) -> Result<Vec<ClusterContext>, SyncError> {
    if selectors.is_empty() {
        return Ok(available);
    }

    for selector in selectors {
        let is_glob = selector.contains('*') || selector.contains('?');
        if !is_glob && !available.iter().any(|c| &c.name == selector) {
            warn!(context = %selector, "Context not found in kubeconfig, skipping");
        }
    }

    let selected: Vec<ClusterContext> = available
        .into_iter()
        .filter(|c| selectors.iter().any(|s| glob_match(s, &c.name)))
        .collect();

    if selected.is_empty() {
        return Err(SyncError::Configuration(format!(
            "no contexts matched {}",
            selectors.join(", ")
        )));
    }
    Ok(selected)
}

/// Kinds named by the selectors (all when none) that pass the table filter.
fn select_kinds(selectors: &[String], filter: &TableFilter) -> Result<BTreeSet<ResourceKind>, SyncError> {
    let requested: BTreeSet<ResourceKind> = if selectors.is_empty() {
        ResourceKind::ALL.into_iter().collect()
    } else {
        selectors
            .iter()
            .map(|s| s.parse().map_err(|e| SyncError::Configuration(format!("{e}"))))
            .collect::<Result<_, _>>()?
    };

    Ok(requested
        .into_iter()
        .filter(|k| filter.allows(k.table_name()))
        .collect())
}

/// Glob match supporting `*` and `?`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('?') => {
                pi += 1;
                ti += 1;
            }
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(c) if *c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                // Let the last star absorb one more character
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(name: &str) -> ClusterContext {
        ClusterContext {
            name: name.to_string(),
            cluster_name: format!("{name}-cluster"),
            server: format!("https://{name}:6443"),
            namespace: "default".to_string(),
            ca_file: String::new(),
            insecure_skip_verify: false,
        }
    }

    fn available() -> Vec<ClusterContext> {
        ["dev", "prod-eu", "prod-us", "staging"].into_iter().map(context).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn names(selection: &SelectionConfig) -> Vec<&str> {
        selection.contexts().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("prod-*", "prod-eu"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("staging-?", "staging-1"));
        assert!(glob_match("k8s_*s", "k8s_pods"));
        assert!(!glob_match("prod-*", "dev"));
        assert!(!glob_match("staging-?", "staging-10"));
        assert!(glob_match("dev", "dev"));
        assert!(!glob_match("dev", "dev2"));
    }

    #[test]
    fn test_empty_selectors_select_all() {
        let selection = SelectionConfig::resolve(&SyncConfig::default(), available()).unwrap();
        assert_eq!(names(&selection), vec!["dev", "prod-eu", "prod-us", "staging"]);
        assert_eq!(selection.tables().len(), ResourceKind::ALL.len());

        let explicit_empty = SyncConfig {
            contexts: Some(Vec::new()),
            resources: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(SelectionConfig::resolve(&explicit_empty, available()).unwrap(), selection);
    }

    #[test]
    fn test_non_empty_selectors_restrict() {
        let config = SyncConfig {
            contexts: Some(strings(&["prod-*", "dev"])),
            resources: Some(strings(&["pods"])),
            ..Default::default()
        };
        let selection = SelectionConfig::resolve(&config, available()).unwrap();
        assert_eq!(names(&selection), vec!["dev", "prod-eu", "prod-us"]);
        assert_eq!(selection.resource_kinds().collect::<Vec<_>>(), vec![ResourceKind::Pod]);
        assert_eq!(selection.kind_names(), vec!["pods"]);
        assert!(!selection.records_clusters());
    }

    #[test]
    fn test_unknown_context_is_skipped() {
        let config = SyncConfig {
            contexts: Some(strings(&["dev", "ghost"])),
            ..Default::default()
        };
        let selection = SelectionConfig::resolve(&config, available()).unwrap();
        assert_eq!(names(&selection), vec!["dev"]);
    }

    #[test]
    fn test_selector_matching_nothing_is_configuration_error() {
        let config = SyncConfig {
            contexts: Some(strings(&["ghost-*"])),
            ..Default::default()
        };
        let err = SelectionConfig::resolve(&config, available()).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(_)));
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let config = SyncConfig {
            resources: Some(strings(&["pods", "configmaps"])),
            ..Default::default()
        };
        let err = SelectionConfig::resolve(&config, available()).unwrap_err();
        assert!(matches!(err, SyncError::Configuration(message) if message.contains("configmaps")));
    }

    #[test]
    fn test_host_table_filter_composes_with_resources() {
        let config = SyncConfig {
            resources: Some(strings(&["namespaces", "pods", "services"])),
            tables: Some(strings(&["k8s_p*", "k8s_services", "k8s_namespaces"])),
            skip_tables: Some(strings(&["k8s_services"])),
            ..Default::default()
        };
        let selection = SelectionConfig::resolve(&config, available()).unwrap();
        assert_eq!(
            selection.resource_kinds().collect::<Vec<_>>(),
            vec![ResourceKind::Namespace, ResourceKind::Pod]
        );
        assert_eq!(
            selection.tables().iter().map(|t| t.name).collect::<Vec<_>>(),
            vec!["k8s_namespaces", "k8s_pods"]
        );
    }

    #[test]
    fn test_skipped_cluster_table_is_not_selected() {
        let config = SyncConfig {
            skip_tables: Some(strings(&["k8s_clusters"])),
            ..Default::default()
        };
        let selection = SelectionConfig::resolve(&config, available()).unwrap();
        assert!(!selection.records_clusters());
        assert!(selection.tables().iter().all(|t| t.name != "k8s_clusters"));
        assert_eq!(selection.resource_kinds().count(), ResourceKind::RESOURCES.len());
    }

    #[test]
    fn test_table_filter() {
        let filter = TableFilter::new(&[], &strings(&["k8s_crds"]));
        assert!(filter.allows("k8s_pods"));
        assert!(!filter.allows("k8s_crds"));
        assert!(TableFilter::default().allows("k8s_crds"));
    }
}
