//! Error types for the rndb engine.

use crate::interval::IntervalError;

/// Broad classification of engine errors.
///
/// Configuration and lifecycle errors mean the schema or session is unusable
/// and are raised at declaration or migration time. Lookup and bounds errors
/// are raised on read paths and are recoverable by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid schema declaration
    Configuration,
    /// Session or table used out of order
    Lifecycle,
    /// Unknown attribute, association or identifier
    Lookup,
    /// Positional index outside a result set
    Bounds,
}

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Distribution cannot partition the identifier space
    #[error("Invalid distribution for column '{column}' of table '{table}': {reason}")]
    InvalidDistribution {
        table: String,
        column: String,
        reason: String,
    },

    /// Column declaration is unusable
    #[error("Invalid column '{column}' of table '{table}': {reason}")]
    InvalidColumn {
        table: String,
        column: String,
        reason: String,
    },

    /// Table size beyond the largest representable identifier
    #[error("Table '{table}' of size {size} exceeds the identifier range")]
    TableTooLarge { table: String, size: u64 },

    /// Same column declared twice
    #[error("Column '{column}' declared twice in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Association refers to a table that is never declared
    #[error("Association '{association}' of table '{table}' targets unknown table '{target}'")]
    UnknownAssociationTarget {
        table: String,
        association: String,
        target: String,
    },

    /// Matched subsets of an association context differ in size
    #[error(
        "Association '{association}' of table '{table}' context {context} matches \
         {source_count} source records but {target_count} target records"
    )]
    AssociationCardinality {
        table: String,
        association: String,
        context: usize,
        source_count: u64,
        target_count: u64,
    },

    /// A session is already open on this thread
    #[error("A session is already open")]
    SessionAlreadyOpen,

    /// Table migrated twice
    #[error("Table '{0}' has already been migrated")]
    TableAlreadyMigrated(String),

    /// Table used before migration
    #[error("Table '{0}' has not been migrated")]
    TableNotMigrated(String),

    /// Attribute not declared on the table
    #[error("Unknown attribute '{attribute}' on table '{table}'")]
    UnknownAttribute { table: String, attribute: String },

    /// Association not declared on the table
    #[error("Unknown association '{association}' on table '{table}'")]
    UnknownAssociation { table: String, association: String },

    /// Identifier outside `[0, size)`
    #[error("Identifier {id} is outside table '{table}' of size {size}")]
    IdentifierOutOfRange { table: String, id: u64, size: u64 },

    /// Positional index outside the result set
    #[error("Index {index} is out of bounds for a result set of {count} records")]
    IndexOutOfBounds { index: i64, count: u64 },

    /// Interval algebra error
    #[error("Interval error: {0}")]
    Interval(#[from] IntervalError),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDistribution { .. }
            | Self::InvalidColumn { .. }
            | Self::DuplicateColumn { .. }
            | Self::UnknownAssociationTarget { .. }
            | Self::AssociationCardinality { .. }
            | Self::TableTooLarge { .. }
            | Self::Interval(_) => ErrorKind::Configuration,
            Self::SessionAlreadyOpen
            | Self::TableAlreadyMigrated(_)
            | Self::TableNotMigrated(_) => ErrorKind::Lifecycle,
            Self::UnknownAttribute { .. }
            | Self::UnknownAssociation { .. }
            | Self::IdentifierOutOfRange { .. } => ErrorKind::Lookup,
            Self::IndexOutOfBounds { .. } => ErrorKind::Bounds,
        }
    }
}

/// Result alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
