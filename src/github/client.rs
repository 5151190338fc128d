use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use super::graphql;
use crate::audit::ReleaseLookup;
use crate::error::{TagLookupError, TransportError};
use crate::query::{BatchOutcome, RepositoryLookup};
use crate::resolver::RepoId;

/// Client for the GitHub API via the `gh` CLI
pub struct GhCli {
    program: PathBuf,
    token: Option<String>,
}

impl GhCli {
    /// Create a client running `program`; `gh` picks up its own credentials
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            token: None,
        }
    }

    /// Authenticate with an explicit access token instead of `gh`'s login
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(token) = &self.token {
            cmd.env("GH_TOKEN", token);
        }
        cmd
    }

    /// Run a GraphQL query through `gh api graphql`.
    ///
    /// `gh` exits non-zero whenever the response carries errors, even if it
    /// also carries data, so the exit status alone decides nothing.
    pub fn graphql(&self, query: &str) -> BatchOutcome {
        let output = match self
            .command()
            .arg("api")
            .arg("graphql")
            .arg("-f")
            .arg(format!("query={}", query))
            .output()
        {
            Ok(output) => output,
            Err(e) => return BatchOutcome::TransportFailure(TransportError::from(e)),
        };

        if !output.status.success() {
            tracing::debug!("gh api graphql exited with {}", output.status);
        }

        graphql::parse_response(&output.stdout, &output.stderr)
    }

    /// Names of every tag of `repo`, across all pages
    pub fn list_tags(&self, repo: &RepoId) -> Result<Vec<String>, TagLookupError> {
        let output = self
            .command()
            .arg("api")
            .arg("--paginate")
            .arg(format!("repos/{}/{}/tags", repo.owner, repo.name))
            .arg("--jq")
            .arg(".[].name")
            .output()?;

        if !output.status.success() {
            return Err(classify_failure(&output));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl RepositoryLookup for GhCli {
    fn lookup(&self, batch: &[RepoId]) -> BatchOutcome {
        self.graphql(&graphql::build_query(batch))
    }
}

impl ReleaseLookup for GhCli {
    fn tags(&self, repo: &RepoId) -> Result<Vec<String>, TagLookupError> {
        self.list_tags(repo)
    }
}

fn classify_failure(output: &Output) -> TagLookupError {
    classify_stderr(&String::from_utf8_lossy(&output.stderr))
}

/// `gh api` reports a missing repository as `gh: Not Found (HTTP 404)`
fn classify_stderr(stderr: &str) -> TagLookupError {
    let stderr = stderr.trim();
    if stderr.contains("HTTP 404") || stderr.contains("Not Found") {
        TagLookupError::NotFound
    } else if stderr.is_empty() {
        TagLookupError::Other("gh exited without a message".to_string())
    } else {
        TagLookupError::Other(stderr.to_string())
    }
}
