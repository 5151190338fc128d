use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::TransportError;
use crate::query::{BatchData, BatchOutcome, RemoteError, RepoNode};
use crate::resolver::RepoId;

/// Alias prefix of each repository in a combined query
const ALIAS_PREFIX: &str = "repo";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Option<Vec<RemoteError>>,
}

/// Build one query asking for every repository in `repos`, aliased `repo0..repoN`
pub fn build_query(repos: &[RepoId]) -> String {
    let mut query = String::from("query {");
    for (i, repo) in repos.iter().enumerate() {
        query.push_str(&format!(
            " {}{}: repository(owner: {}, name: {}) {{ isArchived nameWithOwner }}",
            ALIAS_PREFIX,
            i,
            quote(&repo.owner),
            quote(&repo.name)
        ));
    }
    query.push_str(" }");
    query
}

/// GraphQL string literal
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn alias_index(key: &str) -> Option<usize> {
    let digits = key.strip_prefix(ALIAS_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// A `null` alias is a deletion only when no error names it, or one of the
/// errors naming it is `NOT_FOUND`. `FORBIDDEN`, rate limits and timeouts
/// also null out an alias.
fn null_means_missing(alias: &str, errors: &[RemoteError]) -> bool {
    let mut naming = errors
        .iter()
        .filter(|e| e.path.first().and_then(Value::as_str) == Some(alias))
        .peekable();
    naming.peek().is_none() || naming.any(RemoteError::is_not_found)
}

/// Interpret the raw output of a combined query.
///
/// GitHub answers a missing repository with `null` data plus a `NOT_FOUND`
/// error, so an `errors` array next to `data` is the normal case for a
/// batch containing deleted repositories.
pub fn parse_response(stdout: &[u8], stderr: &[u8]) -> BatchOutcome {
    let stderr = String::from_utf8_lossy(stderr).into_owned();

    if stdout.iter().all(u8::is_ascii_whitespace) {
        return BatchOutcome::TransportFailure(TransportError::EmptyOutput { stderr });
    }

    let response: GraphQlResponse = match serde_json::from_slice(stdout) {
        Ok(response) => response,
        Err(source) => {
            return BatchOutcome::TransportFailure(TransportError::Malformed { source, stderr })
        }
    };

    let errors = response.errors.unwrap_or_default();
    let Some(raw) = response.data else {
        if errors.is_empty() {
            return BatchOutcome::TransportFailure(TransportError::MissingData { stderr });
        }
        return BatchOutcome::PartialOk(BatchData::default(), errors);
    };

    let mut data = BatchData::default();
    for (key, value) in raw {
        let Some(index) = alias_index(&key) else {
            tracing::debug!("ignoring unexpected response key {:?}", key);
            continue;
        };
        if value.is_null() {
            if null_means_missing(&key, &errors) {
                data.insert(index, None);
            } else {
                tracing::debug!("leaving {} unresolved: null alongside a non-NOT_FOUND error", key);
            }
            continue;
        }
        match serde_json::from_value::<RepoNode>(value) {
            Ok(node) => data.insert(index, Some(node)),
            Err(e) => {
                tracing::debug!("ignoring unreadable answer for {}: {}", key, e);
            }
        }
    }

    if errors.is_empty() {
        BatchOutcome::Ok(data)
    } else {
        BatchOutcome::PartialOk(data, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RepoState;

    #[test]
    fn test_build_query_aliases() {
        let query = build_query(&[RepoId::new("a", "b"), RepoId::new("c", "d")]);
        assert!(query.starts_with("query {"));
        assert!(query.contains(r#"repo0: repository(owner: "a", name: "b") { isArchived nameWithOwner }"#));
        assert!(query.contains(r#"repo1: repository(owner: "c", name: "d")"#));
        assert!(query.ends_with('}'));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn test_alias_index() {
        assert_eq!(alias_index("repo0"), Some(0));
        assert_eq!(alias_index("repo12"), Some(12));
        assert_eq!(alias_index("repo"), None);
        assert_eq!(alias_index("repo-1"), None);
        assert_eq!(alias_index("viewer"), None);
    }

    #[test]
    fn test_empty_output() {
        let outcome = parse_response(b"  \n", b"HTTP 502");
        assert!(matches!(
            outcome,
            BatchOutcome::TransportFailure(TransportError::EmptyOutput { .. })
        ));
    }

    #[test]
    fn test_malformed_output() {
        let outcome = parse_response(b"<html>", b"");
        assert!(matches!(
            outcome,
            BatchOutcome::TransportFailure(TransportError::Malformed { .. })
        ));
        let outcome = parse_response(b"{}", b"");
        assert!(matches!(
            outcome,
            BatchOutcome::TransportFailure(TransportError::MissingData { .. })
        ));
    }

    #[test]
    fn test_clean_response() {
        let body = br#"{"data": {
            "repo0": {"isArchived": false, "nameWithOwner": "a/b"},
            "repo1": {"isArchived": true, "nameWithOwner": "c/d"}
        }}"#;
        let BatchOutcome::Ok(data) = parse_response(body, b"") else {
            panic!("expected clean response");
        };
        assert_eq!(data.state(0), Some(RepoState::Active));
        assert_eq!(data.state(1), Some(RepoState::Archived));
    }

    #[test]
    fn test_partial_response_with_not_found() {
        let body = br#"{
            "data": {"repo0": null, "repo1": {"isArchived": false, "nameWithOwner": "c/d"}},
            "errors": [{"type": "NOT_FOUND", "path": ["repo0"], "message": "Could not resolve to a Repository"}]
        }"#;
        let BatchOutcome::PartialOk(data, errors) = parse_response(body, b"") else {
            panic!("expected partial response");
        };
        assert_eq!(data.state(0), Some(RepoState::Missing));
        assert_eq!(data.state(1), Some(RepoState::Active));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_not_found());
    }

    #[test]
    fn test_null_with_other_error_is_unresolved() {
        let body = br#"{
            "data": {"repo0": null, "repo1": null, "repo2": null},
            "errors": [
                {"type": "FORBIDDEN", "path": ["repo0"], "message": "SAML enforcement"},
                {"type": "RATE_LIMITED", "path": ["repo1"], "message": "slow down"},
                {"type": "NOT_FOUND", "path": ["repo2"], "message": "Could not resolve"}
            ]
        }"#;
        let BatchOutcome::PartialOk(data, errors) = parse_response(body, b"") else {
            panic!("expected partial response");
        };
        assert_eq!(data.state(0), None);
        assert_eq!(data.state(1), None);
        assert_eq!(data.state(2), Some(RepoState::Missing));
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_bare_null_is_missing() {
        let body = br#"{"data": {"repo0": null}, "errors": [{"type": "FORBIDDEN", "path": ["repo7"]}]}"#;
        let BatchOutcome::PartialOk(data, _) = parse_response(body, b"") else {
            panic!("expected partial response");
        };
        assert_eq!(data.state(0), Some(RepoState::Missing));
    }

    #[test]
    fn test_errors_without_data() {
        let body = br#"{"data": null, "errors": [{"type": "RATE_LIMITED", "message": "slow down"}]}"#;
        let BatchOutcome::PartialOk(data, errors) = parse_response(body, b"") else {
            panic!("expected partial response");
        };
        assert!(data.is_empty());
        assert!(!errors[0].is_not_found());
    }
}
