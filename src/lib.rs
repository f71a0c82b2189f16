//! rndb Library
//!
//! Command-line plumbing for rndb, a simulator of very large tables that
//! stores nothing but a seed, a schema and hand-made overrides.
//!
//! # Crates
//!
//! - `rndb_core` - Values, constraints, distributions and schema files
//! - `rndb_engine` - Interval algebra, migration, derivation and sessions
//! - `rndb_state` - Override file persistence
//!
//! # CLI Usage
//!
//! ```bash
//! # Count wooden balls that are red or blue
//! rndb --schema demos/ball.yaml count ball -w colour=red,blue -w material=wood
//!
//! # Show two records
//! rndb --schema demos/ball.yaml show ball 0 12345
//!
//! # Apply an override and save it under a name in the state directory
//! rndb --schema demos/ball.yaml dump --set ball:12345:colour=indigo --name indigo
//!
//! # Query with the named overrides applied
//! rndb --schema demos/ball.yaml --state indigo show ball 12345
//! ```

pub mod args;
pub mod output;

use anyhow::Context;
use clap::Args;
use rndb_core::SchemaDefinition;
use rndb_engine::Session;
use rndb_state::{FilesystemStore, OverrideFile, OverrideStore};
use std::path::PathBuf;

pub use args::{parse_constraints, parse_value, OverrideArg};

/// Options shared by every command: where the schema is, which seed to use
/// and which overrides to apply.
#[derive(Args, Clone, Debug)]
pub struct SessionOpts {
    /// Schema file (YAML)
    #[arg(long, env = "RNDB_SCHEMA", value_name = "PATH")]
    pub schema: PathBuf,

    /// Seed; defaults to the schema's seed, then to the current time
    #[arg(long, env = "RNDB_SEED")]
    pub seed: Option<u64>,

    /// Override file to load after migration
    #[arg(long, env = "RNDB_OVERRIDES", value_name = "PATH")]
    pub overrides: Option<PathBuf>,

    /// Directory holding named override files
    #[arg(long, env = "RNDB_STATE_DIR", value_name = "DIR", default_value = ".rndb")]
    pub state_dir: PathBuf,

    /// Named override file in the state directory to load after migration
    #[arg(long, env = "RNDB_STATE", value_name = "NAME")]
    pub state: Option<String>,
}

impl SessionOpts {
    /// Seed to open the session with.
    pub fn resolve_seed(&self, schema: &SchemaDefinition) -> u64 {
        if let Some(seed) = self.seed.or(schema.seed) {
            return seed;
        }
        let seed = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
        tracing::warn!("No seed given; using {seed}. Pass --seed {seed} to reproduce this run");
        seed
    }

    /// Store of named override files.
    pub fn store(&self) -> FilesystemStore {
        FilesystemStore::new(self.state_dir.clone())
    }

    /// Load the schema, open a session, migrate every table and apply the
    /// override file and the named overrides, if any.
    pub fn open_session(&self) -> anyhow::Result<Session> {
        let schema = SchemaDefinition::from_file(&self.schema)
            .with_context(|| format!("Failed to load schema from {:?}", self.schema))?;
        let seed = self.resolve_seed(&schema);

        tracing::info!(
            "Opening session for {} tables (seed={})",
            schema.tables.len(),
            seed
        );
        let mut session = Session::from_schema(&schema, seed)?;

        if let Some(path) = &self.overrides {
            apply_overrides(&mut session, FilesystemStore::read_file(path)?);
        }
        if let Some(name) = &self.state {
            let file = self.store().load(name)?.with_context(|| {
                format!("No override file named '{name}' in {:?}", self.state_dir)
            })?;
            apply_overrides(&mut session, file);
        }
        Ok(session)
    }
}

fn apply_overrides(session: &mut Session, file: OverrideFile) {
    if let Err(e) = file.check_seed(session.seed()) {
        tracing::warn!("{e}; overrides apply regardless");
    }
    session.load(file.into_overrides());
}

/// Snapshot the overrides of a session.
pub fn override_file(session: &Session) -> OverrideFile {
    OverrideFile::new(session.seed(), session.dump().clone())
}

/// Save the overrides of a session under `name`.
pub fn save_overrides(
    store: &dyn OverrideStore,
    name: &str,
    session: &Session,
) -> anyhow::Result<()> {
    store
        .save(name, &override_file(session))
        .with_context(|| format!("Failed to save overrides as '{name}'"))
}
