use std::fmt;

use crate::package::Package;

/// One reportable observation about a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    MissingName,
    MissingUrl,
    MissingMethod,
    IncorrectMethod(String),
    MissingDescription,
    MissingLicense,
    UnknownLicense(String),
    NotOnGitHub,
    LatestTag(String),
    NotReleased,
    MissingFromGitHub,
    FetchFailed(String),
}

impl Finding {
    /// Release status lines, printed for healthy packages too
    pub fn is_informational(&self) -> bool {
        matches!(self, Finding::LatestTag(_) | Finding::NotReleased)
    }

    /// Report line for `pkg`: the name padded to 30 columns, then the message
    pub fn line(&self, pkg: &Package) -> String {
        match self {
            Finding::MissingName => format!("missing name in {}", pkg.display_name()),
            _ => format!("{:<30} {}", pkg.display_name(), self),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::MissingName => write!(f, "missing name"),
            Finding::MissingUrl => write!(f, "missing web URL"),
            Finding::MissingMethod => write!(f, "missing method"),
            Finding::IncorrectMethod(method) => write!(f, "incorrect method: {}", method),
            Finding::MissingDescription => write!(f, "missing or incorrect description"),
            Finding::MissingLicense => write!(f, "missing license"),
            Finding::UnknownLicense(license) => {
                write!(f, "unknown or incorrect license: {}", license)
            }
            Finding::NotOnGitHub => write!(f, "not on GitHub"),
            Finding::LatestTag(tag) => write!(f, "{}", tag),
            Finding::NotReleased => write!(f, "not released"),
            Finding::MissingFromGitHub => write!(f, "is missing from GitHub!"),
            Finding::FetchFailed(reason) => write!(f, "cannot be fetched: {}", reason),
        }
    }
}
