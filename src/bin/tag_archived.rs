use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use package_index_tools::{
    github::GhCli, lifecycle, logging, storage::FilesystemRegistry, Config, RunContext,
};

/// Tag packages whose GitHub repository is archived and move packages whose
/// repository is gone to the deleted index.
///
/// Reads `BATCH_SIZE`, `PACKAGES_FILE`, `DELETED_PACKAGES_FILE` and
/// `GH_PROGRAM` from the environment.
#[derive(Parser)]
#[command(name = "tag-archived", version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug)?;

    let config = Config::load().context("Failed to load configuration")?;
    let store = FilesystemRegistry::new(&config.packages_path, &config.deleted_packages_path);
    let gh = GhCli::new(&config.gh_program);

    let mut ctx = RunContext::new(config, io::stdout().lock());
    lifecycle::run(&mut ctx, &store, &gh)?;
    let _stdout = ctx.finish()?;

    Ok(())
}
