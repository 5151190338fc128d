use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use super::{RegistryState, RegistryStore};
use crate::package::Package;

/// Registry kept as two JSON files
pub struct FilesystemRegistry {
    packages_path: PathBuf,
    deleted_path: PathBuf,
}

impl FilesystemRegistry {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(packages_path: P, deleted_path: Q) -> Self {
        Self {
            packages_path: packages_path.as_ref().to_path_buf(),
            deleted_path: deleted_path.as_ref().to_path_buf(),
        }
    }

    pub fn packages_path(&self) -> &Path {
        &self.packages_path
    }

    pub fn deleted_path(&self) -> &Path {
        &self.deleted_path
    }

    fn read_index(path: &Path) -> Result<Vec<Package>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read package index {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse package index {:?}", path))
    }

    /// Temp file in the target directory, then rename over the target
    fn write_atomic(path: &Path, content: &str) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
        temp.flush()
            .with_context(|| format!("Failed to flush temporary file for {:?}", path))?;
        temp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to replace {:?}", path))?;

        Ok(())
    }
}

impl RegistryStore for FilesystemRegistry {
    fn load_active(&self) -> Result<Vec<Package>> {
        let packages = Self::read_index(&self.packages_path)?;
        tracing::debug!("loaded {} packages from {:?}", packages.len(), self.packages_path);
        Ok(packages)
    }

    fn load_deleted(&self) -> Result<Vec<Package>> {
        if !self.deleted_path.exists() {
            tracing::debug!("{:?} does not exist yet", self.deleted_path);
            return Ok(Vec::new());
        }
        Self::read_index(&self.deleted_path)
    }

    fn save(&self, state: &RegistryState) -> Result<()> {
        // deleted first: an interrupted save may duplicate a record, never drop one
        Self::write_atomic(&self.deleted_path, &render_index(&state.deleted)?)?;
        Self::write_atomic(&self.packages_path, &render_index(&state.active)?)?;
        tracing::debug!(
            "wrote {} active and {} deleted packages",
            state.active.len(),
            state.deleted.len()
        );
        Ok(())
    }
}

/// Two-space indented JSON with sorted tags, literal non-ASCII and one trailing newline
pub fn render_index(packages: &[Package]) -> Result<String> {
    let normalized: Vec<Package> = packages
        .iter()
        .cloned()
        .map(|mut pkg| {
            pkg.normalize_tags();
            pkg
        })
        .collect();

    let mut out =
        serde_json::to_string_pretty(&normalized).context("Failed to serialize package index")?;
    out.push('\n');
    Ok(out)
}
