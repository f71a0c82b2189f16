//! Filesystem-based override storage implementation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::store::OverrideStore;
use crate::OverrideFile;

const PREFIX: &str = "overrides_";
const SUFFIX: &str = ".json";

/// Filesystem implementation of OverrideStore trait.
///
/// Stores override files as `overrides_<name>.json` in a directory.
pub struct FilesystemStore {
    dir: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore with the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the directory path.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Path of the file stored under `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{PREFIX}{name}{SUFFIX}"))
    }

    /// Read an override file from an arbitrary path.
    pub fn read_file(path: impl AsRef<Path>) -> Result<OverrideFile> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read override file {}", path.display()))?;
        OverrideFile::from_json(&content)
            .with_context(|| format!("Failed to parse override file {}", path.display()))
    }

    /// Write an override file to an arbitrary path.
    pub fn write_file(path: impl AsRef<Path>, file: &OverrideFile) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, file.to_json()?)
            .with_context(|| format!("Failed to write override file {}", path.display()))?;
        tracing::info!(
            "Stored {} overridden records to {}",
            file.record_count(),
            path.display()
        );
        Ok(())
    }
}

impl OverrideStore for FilesystemStore {
    fn save(&self, name: &str, file: &OverrideFile) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Self::write_file(self.path_for(name), file)
    }

    fn load(&self, name: &str) -> Result<Option<OverrideFile>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(path).map(Some)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let filename = entry.file_name().to_string_lossy().to_string();
            if let Some(name) = filename
                .strip_prefix(PREFIX)
                .and_then(|rest| rest.strip_suffix(SUFFIX))
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
