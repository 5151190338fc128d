//! Merges upstream repository state back onto package records.
//!
//! Lifecycle policy: a package whose repository no longer exists is tagged
//! `deleted` and moved to the deleted list; a package whose repository is
//! archived is tagged `archived` and stays where it is. Tags only ever grow.

use crate::package::{Package, TAG_ARCHIVED, TAG_DELETED};
use crate::query::{BatchQueryEngine, RepoState, RepositoryLookup};
use crate::resolver::{self, RepoId};
use crate::storage::RegistryState;

/// What a run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Packages that gained the `archived` tag
    pub archived: Vec<String>,
    /// Packages moved to the deleted list
    pub deleted: Vec<String>,
    /// Packages whose repository was looked up
    pub queried: usize,
    /// Packages skipped because they already carry `deleted`
    pub already_deleted: usize,
    /// Batches whose transport failed
    pub failed_batches: usize,
}

impl ReconcileReport {
    /// Whether anything needs writing back
    pub fn changed(&self) -> bool {
        !self.archived.is_empty() || !self.deleted.is_empty()
    }
}

/// Registry after reconciliation, plus what changed
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub state: RegistryState,
    pub report: ReconcileReport,
}

/// Repository to look up for `pkg`, if it should be looked up at all
pub fn lookup_target(pkg: &Package) -> Option<RepoId> {
    if pkg.has_tag(TAG_DELETED) || pkg.method() != Some("git") {
        return None;
    }
    resolver::resolve(pkg.source_url()?)
}

pub struct Reconciler {
    engine: BatchQueryEngine,
}

impl Reconciler {
    pub fn new(engine: BatchQueryEngine) -> Self {
        Self { engine }
    }

    /// Query every eligible active package and apply the answers.
    ///
    /// Packages sharing a repository each receive the same answer. Active
    /// order is preserved; relocated packages are appended to the deleted
    /// list in their original order.
    pub fn run<L: RepositoryLookup + ?Sized>(
        &self,
        state: RegistryState,
        lookup: &L,
    ) -> Reconciliation {
        let RegistryState { active, mut deleted } = state;
        let mut report = ReconcileReport::default();

        let targets: Vec<Option<RepoId>> = active.iter().map(lookup_target).collect();
        report.already_deleted = active.iter().filter(|p| p.has_tag(TAG_DELETED)).count();
        report.queried = targets.iter().flatten().count();

        let ids: Vec<RepoId> = targets.iter().flatten().cloned().collect();
        let results = self.engine.run(&ids, lookup);
        report.failed_batches = results.failed_batches;

        let mut kept = Vec::with_capacity(active.len());
        for (mut pkg, target) in active.into_iter().zip(targets) {
            match target.as_ref().and_then(|id| results.state(id)) {
                Some(RepoState::Missing) => {
                    pkg.add_tag(TAG_DELETED);
                    tracing::debug!("moving {} to the deleted list", pkg.display_name());
                    report.deleted.push(pkg.display_name());
                    deleted.push(pkg);
                }
                Some(RepoState::Archived) => {
                    if pkg.add_tag(TAG_ARCHIVED) {
                        tracing::debug!("tagging {} as archived", pkg.display_name());
                        report.archived.push(pkg.display_name());
                    }
                    kept.push(pkg);
                }
                Some(RepoState::Active) | None => kept.push(pkg),
            }
        }

        Reconciliation {
            state: RegistryState::new(kept, deleted),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pkg(value: serde_json::Value) -> Package {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lookup_target() {
        let git = pkg(json!({"name": "a", "method": "git", "url": "https://github.com/o/a"}));
        assert_eq!(lookup_target(&git), Some(RepoId::new("o", "a")));

        let hg = pkg(json!({"name": "a", "method": "hg", "url": "https://github.com/o/a"}));
        assert_eq!(lookup_target(&hg), None);

        let gone = pkg(json!({
            "name": "a", "method": "git", "url": "https://github.com/o/a", "tags": ["deleted"]
        }));
        assert_eq!(lookup_target(&gone), None);

        let elsewhere = pkg(json!({"name": "a", "method": "git", "url": "https://gitlab.com/o/a"}));
        assert_eq!(lookup_target(&elsewhere), None);

        let web_only = pkg(json!({"name": "a", "method": "git", "web": "https://github.com/o/a"}));
        assert_eq!(lookup_target(&web_only), Some(RepoId::new("o", "a")));
    }

    #[test]
    fn test_report_changed() {
        let mut report = ReconcileReport::default();
        assert!(!report.changed());
        report.queried = 10;
        assert!(!report.changed());
        report.archived.push("x".into());
        assert!(report.changed());
    }
}
