//! Override persistence for rndb
//!
//! Overrides are the only mutable state of a session: attribute values set
//! by hand that win over derived values. This crate saves and restores them
//! so a session can be rebuilt later from the same seed plus its overrides.
//!
//! # Architecture
//!
//! - `OverrideFile` wraps an override map with the seed it was recorded
//!   against and a creation timestamp
//! - `OverrideStore` abstracts where override files live
//!
//! ## Storage Backends
//!
//! - `FilesystemStore` - Stores override files as JSON in a directory

mod file;
mod filesystem;
pub mod store;

#[cfg(test)]
mod tests;

// Re-export file types
pub use file::OverrideFile;

// Re-export store trait
pub use store::OverrideStore;

// Re-export storage implementations
pub use filesystem::FilesystemStore;
