//! Core declarations for rndb.
//!
//! This crate provides the types shared by the rndb engine, the override
//! state store and the command-line driver:
//!
//! - [`Value`] - Attribute values produced by partitions, generators and overrides
//! - [`Constraints`] - The attribute → value(s) query constraint language
//! - [`Distribution`] - Flat and conditional categorical distributions
//! - [`GeneratorConfig`] - Declarative value generators for derived columns
//! - [`SchemaDefinition`] - Schema definitions loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! rndb-core (this crate)
//!    │
//!    ├─── rndb-engine  (interval algebra, partitioner, seeder, sessions)
//!    │
//!    └─── rndb-state   (override persistence)
//! ```

pub mod constraints;
pub mod distribution;
pub mod generator;
pub mod schema;
pub mod values;

// Re-exports for convenience
pub use constraints::Constraints;
pub use distribution::{ConditionalWeights, Distribution, Weights, PROBABILITY_EPSILON};
pub use generator::{CategoryCase, GeneratorConfig};
pub use schema::{
    Association, AssociationContext, ColumnDefinition, SchemaDefinition, SchemaError,
    TableDefinition,
};
pub use values::{OverrideMap, Value};
