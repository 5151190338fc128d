//! Maps a package's declared URL to the GitHub repository it lives in.

use std::fmt;

use url::Url;

/// The only hosting provider the tools know how to query
pub const GITHUB_HOST: &str = "github.com";

/// An (owner, repository) pair on GitHub
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolve `url` to a GitHub repository.
///
/// Accepts http and https, ignores query and fragment, strips a trailing
/// `.git`. Returns `None` for other hosts or fewer than two path segments.
pub fn resolve(url: &str) -> Option<RepoId> {
    let parsed = Url::parse(url.trim()).ok()?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    // the parser lowercases hosts, so this is an exact, case-insensitive match
    if parsed.host_str()? != GITHUB_HOST {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }

    Some(RepoId::new(owner, repo))
}
