//! Batched lookups of repository state.
//!
//! The engine only sees the [`RepositoryLookup`] trait; the production
//! transport lives in [`crate::github`].

mod engine;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::TransportError;
use crate::resolver::RepoId;

pub use engine::{BatchQueryEngine, QueryResults};

/// Error `type` GitHub reports for a repository that does not exist
pub const NOT_FOUND: &str = "NOT_FOUND";

/// What the upstream provider says about one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    /// The repository no longer exists
    Missing,
    /// The repository exists but is read-only
    Archived,
    /// Nothing to do
    Active,
}

/// Repository fields requested per alias
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoNode {
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub name_with_owner: Option<String>,
}

/// An entry of a GraphQL `errors` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteError {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl RemoteError {
    /// A missing repository is the signal we are looking for, not a failure
    pub fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some(NOT_FOUND)
    }
}

/// Per-batch answers keyed by the batch-local index.
///
/// `Some(node)` means the repository exists, `None` means the provider
/// answered `null` for it. An index with no entry is unresolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchData {
    entries: BTreeMap<usize, Option<RepoNode>>,
}

impl BatchData {
    pub fn insert(&mut self, index: usize, node: Option<RepoNode>) {
        self.entries.insert(index, node);
    }

    pub fn state(&self, index: usize) -> Option<RepoState> {
        self.entries.get(&index).map(|node| match node {
            None => RepoState::Missing,
            Some(node) if node.is_archived => RepoState::Archived,
            Some(_) => RepoState::Active,
        })
    }

    pub fn node(&self, index: usize) -> Option<&RepoNode> {
        self.entries.get(&index).and_then(Option::as_ref)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one combined query
#[derive(Debug)]
pub enum BatchOutcome {
    Ok(BatchData),
    /// Data came back together with an `errors` array
    PartialOk(BatchData, Vec<RemoteError>),
    /// Nothing usable came back
    TransportFailure(TransportError),
}

/// Narrow seam to the upstream provider: one call per batch
pub trait RepositoryLookup {
    /// Look up every repository in `batch`; answers are keyed by position in `batch`
    fn lookup(&self, batch: &[RepoId]) -> BatchOutcome;
}

impl<T: RepositoryLookup + ?Sized> RepositoryLookup for &T {
    fn lookup(&self, batch: &[RepoId]) -> BatchOutcome {
        (**self).lookup(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_data_states() {
        let mut data = BatchData::default();
        data.insert(0, None);
        data.insert(
            1,
            Some(RepoNode {
                is_archived: true,
                name_with_owner: Some("a/b".into()),
            }),
        );
        data.insert(
            2,
            Some(RepoNode {
                is_archived: false,
                name_with_owner: None,
            }),
        );

        assert_eq!(data.state(0), Some(RepoState::Missing));
        assert_eq!(data.state(1), Some(RepoState::Archived));
        assert_eq!(data.state(2), Some(RepoState::Active));
        assert_eq!(data.state(3), None);
    }

    #[test]
    fn test_not_found_error_kind() {
        let err: RemoteError = serde_json::from_str(
            r#"{"type": "NOT_FOUND", "path": ["repo0"], "message": "Could not resolve"}"#,
        )
        .unwrap();
        assert!(err.is_not_found());

        let err: RemoteError = serde_json::from_str(r#"{"message": "rate limited"}"#).unwrap();
        assert!(!err.is_not_found());
    }
}
