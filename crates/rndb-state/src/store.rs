//! Override storage trait.

use anyhow::Result;

use crate::OverrideFile;

/// Trait for override storage operations.
///
/// Override files are stored under a name; saving under an existing name
/// replaces the earlier file.
pub trait OverrideStore: Send + Sync {
    /// Store an override file under `name`.
    fn save(&self, name: &str, file: &OverrideFile) -> Result<()>;

    /// Read the override file stored under `name`.
    ///
    /// Returns None if no file is stored under that name.
    fn load(&self, name: &str) -> Result<Option<OverrideFile>>;

    /// Names of stored override files, sorted.
    fn list(&self) -> Result<Vec<String>>;
}
