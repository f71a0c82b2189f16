//! Categorical distribution declarations.
//!
//! A flat distribution is written as a mapping from category to probability,
//! in declaration order:
//!
//! ```yaml
//! distribution: {red: 0.3, green: 0.1, brown: 0.01, blue: 0.5, orange: 0.09}
//! ```
//!
//! A conditional distribution is a list of contexts, each applying its own
//! flat distribution to the records matched by a constraint set:
//!
//! ```yaml
//! distribution:
//!   - when: {colour: red}
//!     distribution: {common: 0.9, rare: 0.1}
//!   - when: {colour: [green, blue]}
//!     distribution: {common: 0.5, rare: 0.5}
//! ```

use crate::constraints::Constraints;
use crate::values::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Tolerance used when checking that probabilities sum to one.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Ordered category → probability mapping.
///
/// Declaration order is significant: categories are laid out over the
/// identifier space in the order they were declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weights {
    entries: Vec<(Value, f64)>,
}

impl Weights {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category. Redeclaring a category replaces its probability
    /// in place.
    pub fn with(mut self, value: impl Into<Value>, probability: f64) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == value) {
            Some(entry) => entry.1 = probability,
            None => self.entries.push((value, probability)),
        }
        self
    }

    /// Categories and probabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, f64)> {
        self.entries.iter().map(|(value, p)| (value, *p))
    }

    /// Categories in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(value, _)| value)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no category is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all probabilities.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Check that the mapping is a usable probability distribution.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("distribution declares no categories".to_string());
        }
        if let Some((value, p)) = self
            .entries
            .iter()
            .find(|(_, p)| !p.is_finite() || *p < 0.0 || *p > 1.0)
        {
            return Err(format!("probability {p} for '{value}' is outside [0, 1]"));
        }
        let total = self.total();
        if (total - 1.0).abs() > PROBABILITY_EPSILON {
            return Err(format!("probabilities sum to {total}, expected 1"));
        }
        Ok(())
    }
}

impl<V: Into<Value>> FromIterator<(V, f64)> for Weights {
    fn from_iter<I: IntoIterator<Item = (V, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |weights, (value, p)| weights.with(value, p))
    }
}

impl Serialize for Weights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (value, probability) in &self.entries {
            map.serialize_entry(value, probability)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Weights {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeightsVisitor;

        impl<'de> Visitor<'de> for WeightsVisitor {
            type Value = Weights;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping from category to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Weights, A::Error> {
                let mut weights = Weights::new();
                while let Some((value, probability)) = access.next_entry::<Value, f64>()? {
                    weights = weights.with(value, probability);
                }
                Ok(weights)
            }
        }

        deserializer.deserialize_map(WeightsVisitor)
    }
}

/// A flat distribution applied to the records matched by `when`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalWeights {
    /// Records this context applies to
    pub when: Constraints,

    /// Distribution over the matched records
    pub distribution: Weights,
}

/// Column distribution declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Distribution {
    /// Contexts evaluated against previously declared columns
    Conditional(Vec<ConditionalWeights>),

    /// One distribution over the whole population
    Flat(Weights),
}

impl Distribution {
    /// Build a flat distribution from `(category, probability)` pairs.
    pub fn flat<V: Into<Value>>(entries: impl IntoIterator<Item = (V, f64)>) -> Self {
        Self::Flat(entries.into_iter().collect())
    }

    /// Every category this distribution can assign, in first-declared order.
    pub fn categories(&self) -> Vec<&Value> {
        match self {
            Self::Flat(weights) => weights.values().collect(),
            Self::Conditional(contexts) => {
                let mut categories: Vec<&Value> = Vec::new();
                for value in contexts.iter().flat_map(|c| c.distribution.values()) {
                    if !categories.contains(&value) {
                        categories.push(value);
                    }
                }
                categories
            }
        }
    }
}

impl From<Weights> for Distribution {
    fn from(weights: Weights) -> Self {
        Self::Flat(weights)
    }
}
