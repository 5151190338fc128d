use std::collections::{HashMap, HashSet};

use indicatif::{ProgressBar, ProgressStyle};

use super::{BatchData, BatchOutcome, RemoteError, RepoState, RepositoryLookup};
use crate::resolver::RepoId;

/// Below this many batches no progress bar is drawn
const PROGRESS_MIN_BATCHES: usize = 4;

/// Answers gathered over a whole run
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    states: HashMap<RepoId, RepoState>,
    /// Lookups issued
    pub batches: usize,
    /// Lookups that yielded nothing because the transport failed
    pub failed_batches: usize,
}

impl QueryResults {
    /// `None` when the repository was never resolved by the provider
    pub fn state(&self, id: &RepoId) -> Option<RepoState> {
        self.states.get(id).copied()
    }

    pub fn resolved(&self) -> usize {
        self.states.len()
    }
}

/// Splits identities into fixed-size batches and queries each one once
#[derive(Debug, Clone, Copy)]
pub struct BatchQueryEngine {
    batch_size: usize,
}

impl BatchQueryEngine {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Query every distinct identity in `ids`, in first-seen order
    pub fn run<L: RepositoryLookup + ?Sized>(&self, ids: &[RepoId], lookup: &L) -> QueryResults {
        let mut results = QueryResults::default();

        let mut seen = HashSet::new();
        let unique: Vec<RepoId> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        if unique.is_empty() {
            return results;
        }

        let batch_count = unique.len().div_ceil(self.batch_size);
        tracing::info!(
            "Querying {} repositories in {} batch(es) of up to {}",
            unique.len(),
            batch_count,
            self.batch_size
        );

        let pb = if batch_count >= PROGRESS_MIN_BATCHES {
            let bar = ProgressBar::new(batch_count as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {msg} [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▓░"),
            );
            bar.set_message("Querying repositories");
            Some(bar)
        } else {
            None
        };

        for (n, batch) in unique.chunks(self.batch_size).enumerate() {
            results.batches += 1;
            tracing::debug!("batch {}/{}: {} repositories", n + 1, batch_count, batch.len());

            match lookup.lookup(batch) {
                BatchOutcome::Ok(data) => absorb(batch, &data, &mut results),
                BatchOutcome::PartialOk(data, errors) => {
                    log_remote_errors(n, &errors);
                    absorb(batch, &data, &mut results);
                }
                BatchOutcome::TransportFailure(e) => {
                    results.failed_batches += 1;
                    tracing::warn!("batch {} skipped: {}", n + 1, e);
                }
            }

            if let Some(ref bar) = pb {
                bar.inc(1);
            }
        }

        if let Some(ref bar) = pb {
            bar.finish_with_message("Repository query complete");
        }

        results
    }
}

/// Map batch-local answers back onto the identities that produced them
fn absorb(batch: &[RepoId], data: &BatchData, results: &mut QueryResults) {
    for index in data.indices() {
        let Some(id) = batch.get(index) else {
            tracing::debug!("ignoring answer for repo{} outside a batch of {}", index, batch.len());
            continue;
        };
        let Some(state) = data.state(index) else {
            continue;
        };

        match state {
            RepoState::Missing => tracing::info!("Repository {} not found", id),
            RepoState::Archived => tracing::info!("Repository {} is archived", id),
            RepoState::Active => {}
        }

        if let Some(canonical) = data.node(index).and_then(|n| n.name_with_owner.as_deref()) {
            if !canonical.eq_ignore_ascii_case(&id.to_string()) {
                tracing::debug!("Repository {} now lives at {}", id, canonical);
            }
        }

        results.states.insert(id.clone(), state);
    }
}

/// Errors worth escalating; `NOT_FOUND` is the deletion signal itself
pub(crate) fn critical_errors(errors: &[RemoteError]) -> Vec<&RemoteError> {
    errors.iter().filter(|e| !e.is_not_found()).collect()
}

fn log_remote_errors(batch: usize, errors: &[RemoteError]) {
    let critical = critical_errors(errors);
    if !critical.is_empty() {
        tracing::warn!(
            "batch {} returned {} critical error(s): {:?}",
            batch + 1,
            critical.len(),
            critical
        );
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::TransportError;
    use crate::query::RepoNode;

    /// Answers from a fixed table and records every batch it was asked for
    struct Scripted {
        missing: Vec<RepoId>,
        archived: Vec<RepoId>,
        fail_batches: Vec<usize>,
        calls: RefCell<Vec<Vec<RepoId>>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                missing: Vec::new(),
                archived: Vec::new(),
                fail_batches: Vec::new(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RepositoryLookup for Scripted {
        fn lookup(&self, batch: &[RepoId]) -> BatchOutcome {
            let call = self.calls.borrow().len();
            self.calls.borrow_mut().push(batch.to_vec());
            if self.fail_batches.contains(&call) {
                return BatchOutcome::TransportFailure(TransportError::EmptyOutput {
                    stderr: "boom".into(),
                });
            }

            let mut data = BatchData::default();
            for (i, id) in batch.iter().enumerate() {
                if self.missing.contains(id) {
                    data.insert(i, None);
                } else {
                    data.insert(
                        i,
                        Some(RepoNode {
                            is_archived: self.archived.contains(id),
                            name_with_owner: Some(id.to_string()),
                        }),
                    );
                }
            }
            BatchOutcome::Ok(data)
        }
    }

    fn ids(n: usize) -> Vec<RepoId> {
        (0..n).map(|i| RepoId::new("owner", format!("repo-{}", i))).collect()
    }

    #[test]
    fn test_partitioning() {
        for (n, size, expected) in [(0, 50, 0), (1, 50, 1), (50, 50, 1), (51, 50, 2), (7, 3, 3)] {
            let lookup = Scripted::new();
            let results = BatchQueryEngine::new(size).run(&ids(n), &lookup);
            let calls = lookup.calls.borrow();
            assert_eq!(calls.len(), expected, "n={} size={}", n, size);
            assert_eq!(results.batches, expected);
            if let Some(last) = calls.last() {
                let tail = if n % size == 0 { size } else { n % size };
                assert_eq!(last.len(), tail);
            }
        }
    }

    #[test]
    fn test_order_is_deterministic_and_deduplicated() {
        let mut input = ids(5);
        input.insert(2, input[0].clone());
        input.push(input[4].clone());

        let lookup = Scripted::new();
        BatchQueryEngine::new(2).run(&input, &lookup);
        let flat: Vec<RepoId> = lookup.calls.borrow().iter().flatten().cloned().collect();
        assert_eq!(flat, ids(5));
    }

    #[test]
    fn test_indices_map_back_across_batches() {
        let all = ids(5);
        let mut lookup = Scripted::new();
        lookup.missing.push(all[3].clone());
        lookup.archived.push(all[4].clone());

        let results = BatchQueryEngine::new(2).run(&all, &lookup);
        assert_eq!(results.state(&all[0]), Some(RepoState::Active));
        assert_eq!(results.state(&all[1]), Some(RepoState::Active));
        assert_eq!(results.state(&all[3]), Some(RepoState::Missing));
        assert_eq!(results.state(&all[4]), Some(RepoState::Archived));
    }

    #[test]
    fn test_transport_failure_only_costs_its_batch() {
        let all = ids(4);
        let mut lookup = Scripted::new();
        lookup.missing = all.clone();
        lookup.fail_batches.push(0);

        let results = BatchQueryEngine::new(2).run(&all, &lookup);
        assert_eq!(results.failed_batches, 1);
        assert_eq!(results.state(&all[0]), None);
        assert_eq!(results.state(&all[1]), None);
        assert_eq!(results.state(&all[2]), Some(RepoState::Missing));
        assert_eq!(results.resolved(), 2);
    }

    #[test]
    fn test_absent_key_is_unresolved() {
        struct Sparse;
        impl RepositoryLookup for Sparse {
            fn lookup(&self, _batch: &[RepoId]) -> BatchOutcome {
                let mut data = BatchData::default();
                data.insert(1, None);
                data.insert(9, None);
                BatchOutcome::PartialOk(data, Vec::new())
            }
        }

        let all = ids(2);
        let results = BatchQueryEngine::new(10).run(&all, &Sparse);
        assert_eq!(results.state(&all[0]), None);
        assert_eq!(results.state(&all[1]), Some(RepoState::Missing));
        assert_eq!(results.resolved(), 1);
    }

    #[test]
    fn test_only_non_not_found_errors_are_critical() {
        let errors: Vec<RemoteError> = serde_json::from_str(
            r#"[
                {"type": "NOT_FOUND", "path": ["repo0"], "message": "Could not resolve"},
                {"type": "FORBIDDEN", "path": ["repo1"], "message": "SAML enforcement"},
                {"message": "Something went wrong"}
            ]"#,
        )
        .unwrap();

        let critical = critical_errors(&errors);
        assert_eq!(critical.len(), 2);
        assert_eq!(critical[0].kind.as_deref(), Some("FORBIDDEN"));
        assert_eq!(critical[1].kind, None);

        assert!(critical_errors(&errors[..1]).is_empty());
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        assert_eq!(BatchQueryEngine::new(0).batch_size(), 1);
    }
}
