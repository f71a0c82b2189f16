//! Value derivation for generated columns.
//!
//! A derivation receives the record identifier, the record's category for the
//! column (when the column also has a distribution) and a generator that has
//! just been reseeded for that exact cell. Anything it draws from the
//! generator is therefore reproducible.
//!
//! [`GeneratorConfig`] values from schema files are derivations, and so is any
//! `Fn(u64, Option<&Value>, &mut StdRng) -> Value` closure.

pub mod array;
pub mod numeric;
pub mod pattern;
pub mod timestamp;
pub mod uuid;

use rand::rngs::StdRng;
use rand::Rng;
use rndb_core::{GeneratorConfig, Value};
use std::fmt;
use std::sync::Arc;

/// Derives an attribute value for one cell.
pub trait Derive: Send + Sync {
    /// Compute the value of record `id`.
    ///
    /// `category` is the record's category for this column, if the column
    /// has a distribution. `rng` is seeded for this cell.
    fn derive(&self, id: u64, category: Option<&Value>, rng: &mut StdRng) -> Value;
}

impl<F> Derive for F
where
    F: Fn(u64, Option<&Value>, &mut StdRng) -> Value + Send + Sync,
{
    fn derive(&self, id: u64, category: Option<&Value>, rng: &mut StdRng) -> Value {
        self(id, category, rng)
    }
}

impl Derive for GeneratorConfig {
    fn derive(&self, id: u64, category: Option<&Value>, rng: &mut StdRng) -> Value {
        generate_value(self, rng, id, category)
    }
}

/// Shared handle to a derivation.
#[derive(Clone)]
pub struct Derivation {
    inner: Arc<dyn Derive>,
    config: Option<GeneratorConfig>,
}

impl Derivation {
    /// Wrap a derivation function.
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn(u64, Option<&Value>, &mut StdRng) -> Value + Send + Sync + 'static,
    {
        Self::from_derive(derive)
    }

    /// Wrap any [`Derive`] implementation.
    pub fn from_derive(derive: impl Derive + 'static) -> Self {
        Self {
            inner: Arc::new(derive),
            config: None,
        }
    }

    /// The generator configuration, when this derivation came from a schema file.
    pub fn config(&self) -> Option<&GeneratorConfig> {
        self.config.as_ref()
    }

    /// Compute the value of one cell.
    pub fn derive(&self, id: u64, category: Option<&Value>, rng: &mut StdRng) -> Value {
        self.inner.derive(id, category, rng)
    }
}

impl From<GeneratorConfig> for Derivation {
    fn from(config: GeneratorConfig) -> Self {
        Self {
            inner: Arc::new(config.clone()),
            config: Some(config),
        }
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config {
            Some(config) => f.debug_tuple("Derivation").field(config).finish(),
            None => f.write_str("Derivation(<fn>)"),
        }
    }
}

/// Generate a value based on the generator configuration.
///
/// `by_category` generators are resolved against `category` first; when no
/// arm applies the value is null.
pub fn generate_value<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
    id: u64,
    category: Option<&Value>,
) -> Value {
    let Some(config) = config.resolve(category) else {
        return Value::Null;
    };

    match config {
        GeneratorConfig::UuidV4 => uuid::generate_uuid_v4(rng),

        GeneratorConfig::Sequential { start } => {
            Value::Int(start.saturating_add(i64::try_from(id).unwrap_or(i64::MAX)))
        }

        GeneratorConfig::Pattern { pattern } => {
            pattern::generate_pattern(pattern, rng, id, category)
        }

        GeneratorConfig::IntRange { min, max } => numeric::generate_int_range(rng, *min, *max),

        GeneratorConfig::FloatRange { min, max } => numeric::generate_float_range(rng, *min, *max),

        GeneratorConfig::DecimalRange { min, max, scale } => {
            numeric::generate_decimal_range(rng, *min, *max, *scale)
        }

        GeneratorConfig::TimestampRange { start, end } => {
            timestamp::generate_timestamp_range(rng, start, end)
        }

        GeneratorConfig::WeightedBool { true_weight } => {
            numeric::generate_weighted_bool(rng, *true_weight)
        }

        GeneratorConfig::OneOf { values } => array::generate_one_of(rng, values),

        GeneratorConfig::SampleArray {
            pool,
            min_length,
            max_length,
        } => array::generate_sample_array(rng, pool, *min_length, *max_length),

        GeneratorConfig::Static { value } => value.clone(),

        // `resolve` never yields a by_category arm
        GeneratorConfig::Null | GeneratorConfig::ByCategory { .. } => Value::Null,
    }
}
