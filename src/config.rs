use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "PACKAGE_INDEX_TOOLS_CONFIG";

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Configuration shared by the tagger and the scanner
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of repositories combined into one upstream query
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,
    /// Active package index
    #[serde(default = "defaults::packages_path")]
    pub packages_path: PathBuf,
    /// Index of packages whose repositories were deleted upstream
    #[serde(default = "defaults::deleted_packages_path")]
    pub deleted_packages_path: PathBuf,
    /// GitHub CLI executable used for upstream queries
    #[serde(default = "defaults::gh_program")]
    pub gh_program: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            packages_path: defaults::packages_path(),
            deleted_packages_path: defaults::deleted_packages_path(),
            gh_program: defaults::gh_program(),
        }
    }
}

impl Config {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                tracing::debug!("loading config from {:?}", path);
                Self::load_from_file(&path)?
            }
            Some(path) => {
                tracing::debug!("no config file at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.packages_path = expand_tilde(&config.packages_path);
        config.deleted_packages_path = expand_tilde(&config.deleted_packages_path);
        config.gh_program = expand_tilde(&config.gh_program);

        Ok(config)
    }

    /// Apply `BATCH_SIZE`, `PACKAGES_FILE`, `DELETED_PACKAGES_FILE` and
    /// `GH_PROGRAM` on top of the current values
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = var("BATCH_SIZE") {
            self.batch_size = size
                .trim()
                .parse()
                .with_context(|| format!("Failed to parse BATCH_SIZE {:?} as usize", size))?;
        }

        if let Some(path) = var("PACKAGES_FILE") {
            self.packages_path = expand_tilde(&PathBuf::from(path));
        }

        if let Some(path) = var("DELETED_PACKAGES_FILE") {
            self.deleted_packages_path = expand_tilde(&PathBuf::from(path));
        }

        if let Some(path) = var("GH_PROGRAM") {
            self.gh_program = expand_tilde(&PathBuf::from(path));
        }

        Ok(())
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            anyhow::bail!("batch size must be a positive integer");
        }
        Ok(())
    }

    /// Config file location: `$PACKAGE_INDEX_TOOLS_CONFIG`, else the user config dir
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            return Some(expand_tilde(&PathBuf::from(path)));
        }
        dirs::home_dir().map(|home| home.join(".config/package-index-tools/config.yaml"))
    }
}

mod defaults {
    use std::path::PathBuf;

    pub(crate) fn batch_size() -> usize {
        50
    }

    pub(crate) fn packages_path() -> PathBuf {
        PathBuf::from("packages.json")
    }

    pub(crate) fn deleted_packages_path() -> PathBuf {
        PathBuf::from("deleted_packages.json")
    }

    pub(crate) fn gh_program() -> PathBuf {
        PathBuf::from("gh")
    }
}
