#![deny(clippy::mod_module_files)]
//! Maintenance utilities for a JSON package index.
//!
//! Two flows share the index: the lifecycle tagger, which asks GitHub about
//! every git-hosted package and relocates deleted ones, and the audit scanner,
//! which reports metadata problems per package.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod lifecycle;
pub mod logging;
pub mod package;
pub mod query;
pub mod reconcile;
pub mod resolver;
pub mod storage;

pub use config::Config;
pub use context::RunContext;
pub use package::Package;
pub use resolver::RepoId;
