use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::Config;

/// Everything one run needs, created once in `main` and handed down.
///
/// `out` receives the user-facing report; diagnostics go through `tracing`.
pub struct RunContext<W: Write> {
    config: Config,
    out: W,
    started_at: DateTime<Utc>,
}

impl<W: Write> RunContext<W> {
    pub fn new(config: Config, out: W) -> Self {
        let started_at = Utc::now();
        tracing::debug!("run started at {}", started_at.to_rfc3339());
        Self {
            config,
            out,
            started_at,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    /// Flush the report and hand the sink back
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("Failed to flush report output")?;
        let elapsed = Utc::now() - self.started_at;
        tracing::debug!("run finished in {} ms", elapsed.num_milliseconds());
        Ok(self.out)
    }
}
