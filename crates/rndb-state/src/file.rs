//! Override file wrapper for storage-agnostic serialization.

use chrono::{DateTime, Utc};
use rndb_core::OverrideMap;
use serde::{Deserialize, Serialize};

/// Storage-agnostic override file.
///
/// Derived values depend on the seed, so the seed is recorded alongside the
/// overrides it was taken from.
///
/// # File Format
///
/// ```json
/// {
///     "seed": 137,
///     "overrides": {
///         "ball": {
///             "12345": { "colour": "indigo" }
///         }
///     },
///     "created_at": "2024-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideFile {
    /// Seed of the session the overrides were taken from
    pub seed: u64,
    /// Overrides keyed table, then identifier, then attribute
    pub overrides: OverrideMap,
    /// Timestamp when this file was created
    pub created_at: DateTime<Utc>,
}

impl OverrideFile {
    /// Wrap the overrides of a session opened with `seed`.
    pub fn new(seed: u64, overrides: OverrideMap) -> Self {
        Self {
            seed,
            overrides,
            created_at: Utc::now(),
        }
    }

    /// Parse an override file from JSON.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fail unless the overrides were recorded against `seed`.
    pub fn check_seed(&self, seed: u64) -> anyhow::Result<()> {
        if self.seed != seed {
            anyhow::bail!(
                "Override file seed mismatch: expected {}, found {}",
                seed,
                self.seed
            );
        }
        Ok(())
    }

    /// Number of overridden records across all tables.
    pub fn record_count(&self) -> usize {
        self.overrides.values().map(|records| records.len()).sum()
    }

    /// Consume the file, returning its overrides.
    pub fn into_overrides(self) -> OverrideMap {
        self.overrides
    }
}
