//! Schema declarations for rndb.
//!
//! A schema file declares a seed and a list of tables. Each table has a size
//! (its identifier space is `[0, size)`), an ordered list of columns and a
//! list of associations to other tables:
//!
//! ```yaml
//! version: 1
//! seed: 137
//! tables:
//!   - name: ball
//!     size: 1000000
//!     columns:
//!       - name: colour
//!         distribution: {red: 0.3, green: 0.1, brown: 0.01, blue: 0.5, orange: 0.09}
//!       - name: weight
//!         distribution: {light: 0.3, medium: 0.6, heavy: 0.1}
//!         generator:
//!           type: by_category
//!           cases:
//!             - {value: light, generator: {type: float_range, min: 0.1, max: 3.0}}
//!     associations:
//!       - name: twin
//!         target: ball
//!         contexts:
//!           - {source: {colour: red}, target: {colour: red}}
//! ```

use crate::constraints::Constraints;
use crate::distribution::Distribution;
use crate::generator::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in table schema
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },
}

/// Column declaration: a distribution, a generator, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,

    /// Categorical distribution partitioning the identifier space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,

    /// Generator deriving the attribute value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorConfig>,
}

/// One context of an association: records of the owning table matched by
/// `source` pair up, by position, with records of the target table matched
/// by `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationContext {
    /// Constraints on the owning table
    #[serde(default)]
    pub source: Constraints,

    /// Constraints on the target table
    #[serde(default)]
    pub target: Constraints,
}

/// Named association from one table to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    /// Association name
    pub name: String,

    /// Name of the associated table
    pub target: String,

    /// Contexts, tried in order; the first whose source matches wins
    pub contexts: Vec<AssociationContext>,
}

impl Association {
    /// Create an association with no contexts.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            contexts: Vec::new(),
        }
    }

    /// Append a context.
    pub fn context(mut self, source: Constraints, target: Constraints) -> Self {
        self.contexts.push(AssociationContext { source, target });
        self
    }
}

/// Table declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name
    pub name: String,

    /// Number of records to simulate
    pub size: u64,

    /// Column declarations, in migration order
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,

    /// Association declarations
    #[serde(default)]
    pub associations: Vec<Association>,
}

impl TableDefinition {
    /// Get a column declaration by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

fn default_version() -> u32 {
    1
}

/// Full schema declaration, usually loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Database seed; callers may override it
    #[serde(default)]
    pub seed: Option<u64>,

    /// Table declarations, in migration order
    pub tables: Vec<TableDefinition>,

    /// Cached table lookup (not serialized)
    #[serde(skip)]
    table_map: HashMap<String, usize>,
}

impl SchemaDefinition {
    /// Create a schema from table declarations.
    pub fn new(seed: Option<u64>, tables: Vec<TableDefinition>) -> Self {
        let mut schema = Self {
            version: default_version(),
            seed,
            tables,
            table_map: HashMap::new(),
        };
        schema.build_table_map();
        schema
    }

    /// Parse a schema from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let mut schema: Self = serde_yaml::from_str(yaml)?;
        schema.build_table_map();
        Ok(schema)
    }

    /// Load a schema from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Build the internal table lookup map.
    fn build_table_map(&mut self) {
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (table.name.clone(), idx))
            .collect();
    }

    /// Get a table declaration by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDefinition> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Get a column declaration, failing with a descriptive error.
    pub fn get_column(&self, table: &str, column: &str) -> Result<&ColumnDefinition, SchemaError> {
        let table_schema = self
            .get_table(table)
            .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))?;

        table_schema
            .get_column(column)
            .ok_or_else(|| SchemaError::ColumnNotFound {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Get all table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}
