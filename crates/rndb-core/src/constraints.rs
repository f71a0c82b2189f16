//! Query constraint language.
//!
//! A constraint set maps attribute names to one or more acceptable values:
//!
//! ```yaml
//! colour: [red, blue]
//! material: wood
//! ```
//!
//! An empty constraint set selects every record of a table.

use crate::values::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One value or a list of values, as written in YAML/JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

/// Attribute constraints, ordered by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, OneOrMany>", into = "BTreeMap<String, OneOrMany>")]
pub struct Constraints {
    attributes: BTreeMap<String, Vec<Value>>,
}

impl Constraints {
    /// Create an empty constraint set, which matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `attribute` to equal `value`.
    pub fn with(self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_any(attribute, [value])
    }

    /// Require `attribute` to equal any of `values`.
    ///
    /// Constraining the same attribute twice replaces the earlier values.
    pub fn with_any<V: Into<Value>>(
        mut self,
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.attributes
            .insert(attribute.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether no attribute is constrained.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Number of constrained attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Acceptable values for an attribute, if it is constrained.
    pub fn get(&self, attribute: &str) -> Option<&[Value]> {
        self.attributes.get(attribute).map(Vec::as_slice)
    }

    /// Iterate over `(attribute, acceptable values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.attributes
            .iter()
            .map(|(attribute, values)| (attribute.as_str(), values.as_slice()))
    }
}

impl From<BTreeMap<String, OneOrMany>> for Constraints {
    fn from(raw: BTreeMap<String, OneOrMany>) -> Self {
        let attributes = raw
            .into_iter()
            .map(|(attribute, values)| {
                let values = match values {
                    OneOrMany::Many(values) => values,
                    OneOrMany::One(value) => vec![value],
                };
                (attribute, values)
            })
            .collect();
        Self { attributes }
    }
}

impl From<Constraints> for BTreeMap<String, OneOrMany> {
    fn from(constraints: Constraints) -> Self {
        constraints
            .attributes
            .into_iter()
            .map(|(attribute, mut values)| {
                let values = if values.len() == 1 {
                    OneOrMany::One(values.remove(0))
                } else {
                    OneOrMany::Many(values)
                };
                (attribute, values)
            })
            .collect()
    }
}
