use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use package_index_tools::{
    audit, github::GhCli, logging, storage::FilesystemRegistry, storage::RegistryStore, Config,
    RunContext,
};

/// Check every package for missing or unknown metadata and report the
/// latest release of GitHub-hosted ones.
#[derive(Parser)]
#[command(name = "package-scanner", version)]
struct Cli {
    /// GitHub access token used for the release lookups
    github_token: String,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug)?;

    let config = Config::load().context("Failed to load configuration")?;
    let store = FilesystemRegistry::new(&config.packages_path, &config.deleted_packages_path);
    let packages = store.load_active()?;
    let gh = GhCli::new(&config.gh_program).with_token(cli.github_token);

    let mut ctx = RunContext::new(config, io::stdout().lock());
    audit::scan(&mut ctx, packages, &gh)?;
    let _stdout = ctx.finish()?;

    Ok(())
}
