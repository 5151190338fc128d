//! Metadata audit of the package index.
//!
//! Each package is checked independently and every problem is reported on its
//! own line, name first. GitHub-hosted packages additionally get their latest
//! tag looked up.

mod findings;
mod licenses;

use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use crate::context::RunContext;
use crate::error::TagLookupError;
use crate::package::Package;
use crate::resolver::{self, RepoId};

pub use findings::Finding;
pub use licenses::{is_known_license, KNOWN_LICENSES};

/// Per-repository tag listing used for the release check
pub trait ReleaseLookup {
    fn tags(&self, repo: &RepoId) -> Result<Vec<String>, TagLookupError>;
}

/// Counters for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub scanned: usize,
    pub lines: usize,
    /// Packages with no metadata problem (the release line does not count)
    pub clean: usize,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Checks that need nothing but the record itself.
///
/// Returns the findings and, when the package is GitHub-hosted, the
/// repository for the release check. A missing name or URL stops here.
pub fn check_metadata(pkg: &Package) -> (Vec<Finding>, Option<RepoId>) {
    let mut findings = Vec::new();

    if pkg.name().is_none() {
        findings.push(Finding::MissingName);
        return (findings, None);
    }
    let Some(url) = pkg.source_url() else {
        findings.push(Finding::MissingUrl);
        return (findings, None);
    };

    match pkg.field("method") {
        None => findings.push(Finding::MissingMethod),
        Some(Value::String(m)) if m == "git" => {}
        Some(other) => findings.push(Finding::IncorrectMethod(value_text(other))),
    }

    if pkg.description().map_or(true, str::is_empty) {
        findings.push(Finding::MissingDescription);
    }

    match pkg.field("license") {
        None => findings.push(Finding::MissingLicense),
        Some(Value::String(l)) if is_known_license(l) => {}
        Some(other) => findings.push(Finding::UnknownLicense(value_text(other))),
    }

    let repo = resolver::resolve(url);
    if repo.is_none() {
        findings.push(Finding::NotOnGitHub);
    }
    (findings, repo)
}

/// Latest-tag check against the provider
pub fn check_release<R: ReleaseLookup + ?Sized>(repo: &RepoId, releases: &R) -> Finding {
    match releases.tags(repo) {
        Ok(tags) => match tags.into_iter().max() {
            Some(latest) => Finding::LatestTag(latest),
            None => Finding::NotReleased,
        },
        Err(TagLookupError::NotFound) => Finding::MissingFromGitHub,
        Err(TagLookupError::Other(reason)) => Finding::FetchFailed(reason),
    }
}

/// Every finding for `pkg`, in report order
pub fn check_package<R: ReleaseLookup + ?Sized>(pkg: &Package, releases: &R) -> Vec<Finding> {
    let (mut findings, repo) = check_metadata(pkg);
    if let Some(repo) = repo {
        findings.push(check_release(&repo, releases));
    }
    findings
}

/// Audit `packages` in name order, writing one line per finding
pub fn scan<W, R>(
    ctx: &mut RunContext<W>,
    mut packages: Vec<Package>,
    releases: &R,
) -> Result<AuditSummary>
where
    W: Write,
    R: ReleaseLookup + ?Sized,
{
    packages.sort_by(|a, b| a.name().cmp(&b.name()));

    let mut summary = AuditSummary::default();
    for pkg in &packages {
        summary.scanned += 1;
        tracing::debug!("checking {}", pkg.display_name());

        let findings = check_package(pkg, releases);
        if findings.iter().all(Finding::is_informational) {
            summary.clean += 1;
        }
        for finding in &findings {
            writeln!(ctx.out(), "{}", finding.line(pkg))?;
            summary.lines += 1;
        }
    }

    tracing::debug!(
        "scanned {} packages, {} clean, {} lines reported",
        summary.scanned,
        summary.clean,
        summary.lines
    );
    Ok(summary)
}
