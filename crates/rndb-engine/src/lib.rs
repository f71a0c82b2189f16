//! Interval-indexed partitioning and deterministic derivation engine.
//!
//! rndb simulates tables of any size without storing them. Categorical
//! columns are laid out once, at migration, as interval sets over the
//! identifier space; every other attribute is derived on demand from a
//! generator reseeded for that exact cell. Queries are interval algebra, so
//! counting and positional access cost nothing per record.
//!
//! # Example
//!
//! ```
//! use rndb_engine::{Column, Session, TableSchema};
//! use rndb_core::{Constraints, Distribution};
//!
//! let mut session = Session::open(137)?;
//! session.add_table(
//!     TableSchema::new("ball").column(
//!         Column::new("colour").with_distribution(Distribution::flat([("red", 0.3), ("blue", 0.7)])),
//!     ),
//!     1_000_000,
//! )?;
//!
//! let red = session
//!     .table("ball")?
//!     .filter(&Constraints::new().with("colour", "red"))?;
//! assert_eq!(red.count(), 300_000);
//! # Ok::<(), rndb_engine::Error>(())
//! ```

pub mod error;
pub mod generators;
pub mod interval;
pub mod interval_set;
pub mod partition;
pub mod query;
pub mod record;
pub mod seeder;
pub mod session;
pub mod table;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};
pub use generators::{Derivation, Derive};
pub use interval::{Interval, IntervalError};
pub use interval_set::IntervalSet;
pub use partition::ColumnPartition;
pub use query::Query;
pub use record::Record;
pub use seeder::{cell_seed, Seeder};
pub use session::{Session, TableRef};
pub use table::{Column, Table, TableSchema, ID_ATTRIBUTE, MAX_TABLE_SIZE, SAMPLE_LABEL};
