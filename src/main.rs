//! Command-line interface for rndb
//!
//! # Usage Examples
//!
//! ## Queries
//! ```bash
//! # Count matching records
//! rndb --schema demos/ball.yaml count ball -w colour=red,blue -w material=wood
//!
//! # Print the first ten matching records as JSON lines
//! rndb --schema demos/ball.yaml query ball -w colour=green --limit 10
//!
//! # Print a reproducible sample
//! rndb --schema demos/ball.yaml sample ball -n 5 --attributes id,weight
//!
//! # Print one attribute of every matching record
//! rndb --schema demos/ball.yaml pluck ball weight -w material=fluff --limit 3
//! ```
//!
//! ## Records and Associations
//! ```bash
//! rndb --schema demos/ball.yaml show ball 0 12345
//! rndb --schema demos/ball.yaml join ball 12345 owner
//! ```
//!
//! ## Overrides
//! ```bash
//! # Record overrides and write them to a file
//! rndb --schema demos/ball.yaml dump --set ball:12345:colour=indigo --output state.json
//!
//! # Or save them by name in the state directory (.rndb by default) and list names
//! rndb --schema demos/ball.yaml dump --set ball:12345:colour=indigo --name indigo
//! rndb --schema demos/ball.yaml states
//!
//! # Check an override file against the schema
//! rndb --schema demos/ball.yaml load state.json
//!
//! # Apply an override file, or named overrides, to any command
//! rndb --schema demos/ball.yaml --overrides state.json show ball 12345
//! rndb --schema demos/ball.yaml --state indigo show ball 12345
//! ```
//!
//! The schema, seed and override file may also be given as `RNDB_SCHEMA`,
//! `RNDB_SEED` and `RNDB_OVERRIDES`; the state directory and name as
//! `RNDB_STATE_DIR` and `RNDB_STATE`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rndb::output::{write_records, write_values};
use rndb::{override_file, parse_constraints, save_overrides, OverrideArg, SessionOpts};
use rndb_engine::Session;
use rndb_state::{FilesystemStore, OverrideStore};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rndb")]
#[command(about = "Query deterministic simulated tables of any size")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    session: SessionOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count records matching constraints
    Count {
        /// Table name
        table: String,

        /// Constraint as attribute=value[,value...]; repeat to intersect
        #[arg(short = 'w', long = "where", value_name = "CONSTRAINT")]
        constraints: Vec<String>,
    },

    /// Print records by identifier
    Show {
        /// Table name
        table: String,

        /// Record identifiers
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Print records matching constraints
    Query {
        /// Table name
        table: String,

        /// Constraint as attribute=value[,value...]; repeat to intersect
        #[arg(short = 'w', long = "where", value_name = "CONSTRAINT")]
        constraints: Vec<String>,

        /// Skip this many matching records
        #[arg(long, default_value_t = 0)]
        offset: u64,

        /// Print at most this many records
        #[arg(long, default_value_t = 10)]
        limit: u64,

        /// Attributes to print (comma separated); all columns by default
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,
    },

    /// Print a reproducible random sample of matching records
    Sample {
        /// Table name
        table: String,

        /// Constraint as attribute=value[,value...]; repeat to intersect
        #[arg(short = 'w', long = "where", value_name = "CONSTRAINT")]
        constraints: Vec<String>,

        /// Sample size
        #[arg(short = 'n', long, default_value_t = 10)]
        size: u64,

        /// Attributes to print (comma separated); all columns by default
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,
    },

    /// Print one attribute of matching records, one value per line
    Pluck {
        /// Table name
        table: String,

        /// Attribute to print
        attribute: String,

        /// Constraint as attribute=value[,value...]; repeat to intersect
        #[arg(short = 'w', long = "where", value_name = "CONSTRAINT")]
        constraints: Vec<String>,

        /// Print at most this many values
        #[arg(long, default_value_t = 10)]
        limit: u64,
    },

    /// Print the record associated with a record
    Join {
        /// Table name
        table: String,

        /// Record identifier
        id: u64,

        /// Association name
        association: String,
    },

    /// Write the session's overrides as an override file
    Dump {
        /// Override as table:id:attribute=value; repeatable
        #[arg(long = "set", value_name = "OVERRIDE")]
        overrides: Vec<OverrideArg>,

        /// Output file; stdout when neither this nor --name is given
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Save under this name in the state directory
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// List the named override files in the state directory
    States,

    /// Check an override file against the schema and summarize it
    Load {
        /// Override file
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Count { table, constraints } => {
            let session = cli.session.open_session()?;
            let count = session
                .table(&table)?
                .count(&parse_constraints(&constraints)?)?;
            writeln!(out, "{count}")?;
        }
        Commands::Show { table, ids } => {
            let session = cli.session.open_session()?;
            let table = session.table(&table)?;
            let records = ids
                .into_iter()
                .map(|id| table.get(id))
                .collect::<Result<Vec<_>, _>>()?;
            write_records(&mut out, records.into_iter(), &[])?;
        }
        Commands::Query {
            table,
            constraints,
            offset,
            limit,
            attributes,
        } => {
            let session = cli.session.open_session()?;
            let query = session
                .table(&table)?
                .filter(&parse_constraints(&constraints)?)?;
            tracing::info!("{} records match", query.count());

            let attributes: Vec<&str> = attributes.iter().map(String::as_str).collect();
            let end = offset.saturating_add(limit).min(query.count());
            let records = (offset..end)
                .filter_map(|index| i64::try_from(index).ok().and_then(|index| query.get(index)));
            write_records(&mut out, records, &attributes)?;
        }
        Commands::Sample {
            table,
            constraints,
            size,
            attributes,
        } => {
            let session = cli.session.open_session()?;
            let sample = session
                .table(&table)?
                .filter(&parse_constraints(&constraints)?)?
                .sample(size);

            let attributes: Vec<&str> = attributes.iter().map(String::as_str).collect();
            write_records(&mut out, sample.iter(), &attributes)?;
        }
        Commands::Pluck {
            table,
            attribute,
            constraints,
            limit,
        } => {
            let session = cli.session.open_session()?;
            let query = session
                .table(&table)?
                .filter(&parse_constraints(&constraints)?)?;
            let values = query
                .iter()
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(|mut record| record.get(&attribute))
                .collect::<Result<Vec<_>, _>>()?;
            write_values(&mut out, &values)?;
        }
        Commands::Join {
            table,
            id,
            association,
        } => {
            let session = cli.session.open_session()?;
            match session.table(&table)?.join(id, &association)? {
                Some(record) => {
                    write_records(&mut out, std::iter::once(record), &[])?;
                }
                None => tracing::warn!(
                    "No context of association '{association}' matches {table} {id}"
                ),
            }
        }
        Commands::Dump {
            overrides,
            output,
            name,
        } => {
            let mut session = cli.session.open_session()?;
            apply_overrides(&mut session, overrides)?;
            if let Some(name) = &name {
                save_overrides(&cli.session.store(), name, &session)?;
            }
            let file = override_file(&session);
            match output {
                Some(path) => FilesystemStore::write_file(&path, &file)?,
                None if name.is_none() => writeln!(out, "{}", file.to_json()?)?,
                None => {}
            }
        }
        Commands::States => {
            for name in cli.session.store().list()? {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Load { input } => {
            let session = cli.session.open_session()?;
            let file = FilesystemStore::read_file(&input)?;
            file.check_seed(session.seed())?;
            for (table, records) in &file.overrides {
                let target = session
                    .table(table)
                    .with_context(|| format!("Override file {:?} names unknown table", input))?;
                for (id, attributes) in records {
                    for attribute in attributes.keys() {
                        target.value(*id, attribute).with_context(|| {
                            format!("Override {table}:{id}:{attribute} does not apply")
                        })?;
                    }
                }
                writeln!(out, "{table}: {} overridden records", records.len())?;
            }
        }
    }

    Ok(())
}

fn apply_overrides(session: &mut Session, overrides: Vec<OverrideArg>) -> anyhow::Result<()> {
    for arg in overrides {
        tracing::debug!(
            "Setting {}:{}:{} = {}",
            arg.table,
            arg.id,
            arg.attribute,
            arg.value
        );
        session.set_override(&arg.table, arg.id, &arg.attribute, arg.value)?;
    }
    Ok(())
}
