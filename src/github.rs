//! GitHub access through the `gh` command line client.

mod client;
mod graphql;

pub use client::GhCli;
pub use graphql::{build_query, parse_response};
