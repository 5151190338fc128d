//! The tagging flow: load, query, reconcile, write back if anything changed.

use std::{io::Write, path::Path};

use anyhow::Result;

use crate::context::RunContext;
use crate::query::{BatchQueryEngine, RepositoryLookup};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::storage::RegistryStore;

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Run one reconciliation against `store`.
///
/// Nothing is written unless a package was newly tagged or relocated.
pub fn run<W, S, L>(ctx: &mut RunContext<W>, store: &S, lookup: &L) -> Result<ReconcileReport>
where
    W: Write,
    S: RegistryStore + ?Sized,
    L: RepositoryLookup + ?Sized,
{
    let state = store.load()?;
    let total = state.len();
    tracing::info!(
        "Loaded {} active and {} deleted packages",
        state.active.len(),
        state.deleted.len()
    );

    let reconciler = Reconciler::new(BatchQueryEngine::new(ctx.config().batch_size));
    let reconciliation = reconciler.run(state, lookup);
    let report = reconciliation.report;
    debug_assert_eq!(reconciliation.state.len(), total);

    tracing::debug!(
        "queried {} packages, skipped {} already deleted",
        report.queried,
        report.already_deleted
    );
    if report.failed_batches > 0 {
        tracing::warn!("{} batch(es) returned no results", report.failed_batches);
    }

    let packages_label = file_label(&ctx.config().packages_path);
    let deleted_label = file_label(&ctx.config().deleted_packages_path);
    let out = ctx.out();

    if !report.archived.is_empty() {
        writeln!(out, "Tagged as archived:")?;
        for name in &report.archived {
            writeln!(out, "  {}", name)?;
        }
    }
    if !report.deleted.is_empty() {
        writeln!(out, "Moved to {}:", deleted_label)?;
        for name in &report.deleted {
            writeln!(out, "  {}", name)?;
        }
    }

    if report.changed() {
        store.save(&reconciliation.state)?;
        writeln!(out, "{} updated.", packages_label)?;
    } else {
        writeln!(out, "No new archived or deleted repositories found.")?;
    }

    Ok(report)
}
