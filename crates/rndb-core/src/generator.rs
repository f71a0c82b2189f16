//! Generator configuration for derived columns.
//!
//! A generator turns a deterministically seeded random stream, the record
//! identifier and (optionally) the record's category into a value.

use crate::values::Value;
use serde::{Deserialize, Serialize};

fn default_decimal_scale() -> u32 {
    2
}

/// Generator configuration for a column.
///
/// This enum defines the different types of value generators available
/// for deriving attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// Generate UUIDs (v4) from the seeded stream
    UuidV4,

    /// Identifier offset by `start`
    Sequential {
        /// Starting value
        #[serde(default)]
        start: i64,
    },

    /// Generate values using a pattern with placeholders
    Pattern {
        /// Pattern string (supports {id}, {category}, {uuid}, {rand:N})
        pattern: String,
    },

    /// Generate random integers in a range
    IntRange {
        /// Minimum value (inclusive)
        min: i64,
        /// Maximum value (inclusive)
        max: i64,
    },

    /// Generate random floats in a range
    FloatRange {
        /// Minimum value (inclusive)
        min: f64,
        /// Maximum value (inclusive)
        max: f64,
    },

    /// Generate random floats in a range, rounded to `scale` decimal places
    DecimalRange {
        /// Minimum value (inclusive)
        min: f64,
        /// Maximum value (inclusive)
        max: f64,
        /// Digits after the decimal point
        #[serde(default = "default_decimal_scale")]
        scale: u32,
    },

    /// Generate timestamps in a range
    TimestampRange {
        /// Start timestamp (RFC 3339 or YYYY-MM-DD)
        start: String,
        /// End timestamp (RFC 3339 or YYYY-MM-DD)
        end: String,
    },

    /// Generate weighted boolean values
    WeightedBool {
        /// Weight for true value (0.0 to 1.0)
        true_weight: f64,
    },

    /// Generate random selection from a pool of values
    OneOf {
        /// Pool of values to select from
        values: Vec<Value>,
    },

    /// Generate arrays by sampling from a pool
    SampleArray {
        /// Pool of values to sample from
        pool: Vec<Value>,
        /// Minimum array length
        #[serde(default)]
        min_length: usize,
        /// Maximum array length
        max_length: usize,
    },

    /// Generate a static value
    Static {
        /// The static value to use
        value: Value,
    },

    /// Generate null values
    Null,

    /// Pick a generator by the record's category
    ByCategory {
        /// Generator per category
        cases: Vec<CategoryCase>,
        /// Generator for categories without a case; null when absent
        #[serde(default)]
        default: Option<Box<GeneratorConfig>>,
    },
}

/// One arm of a [`GeneratorConfig::ByCategory`] generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCase {
    /// Category this arm applies to
    pub value: Value,

    /// Generator used for records in that category
    pub generator: GeneratorConfig,
}

impl GeneratorConfig {
    /// Select the generator for a category, following `by_category` arms.
    ///
    /// Returns `None` when no arm matches and no default is configured.
    pub fn resolve(&self, category: Option<&Value>) -> Option<&GeneratorConfig> {
        match self {
            Self::ByCategory { cases, default } => {
                let case = category.and_then(|category| {
                    cases.iter().find(|case| &case.value == category)
                });
                match case {
                    Some(case) => case.generator.resolve(category),
                    None => default.as_deref()?.resolve(category),
                }
            }
            other => Some(other),
        }
    }

    /// Check the configuration before any value is drawn from it.
    ///
    /// Float bounds must be finite with a finite width. `by_category` arms
    /// and the default are checked too. Returns a human-readable reason on
    /// failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::FloatRange { min, max } | Self::DecimalRange { min, max, .. } => {
                if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
                    return Err(format!("float range [{min}, {max}] is not finite"));
                }
                Ok(())
            }
            Self::WeightedBool { true_weight } if !true_weight.is_finite() => {
                Err(format!("true_weight {true_weight} is not finite"))
            }
            Self::ByCategory { cases, default } => {
                for case in cases {
                    case.generator
                        .validate()
                        .map_err(|reason| format!("case '{}': {reason}", case.value))?;
                }
                match default {
                    Some(default) => default.validate(),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generators() {
        let yaml = r#"
- type: sequential
  start: 10
- type: float_range
  min: 0.1
  max: 3.0
- type: one_of
  values: [north, south]
- type: decimal_range
  min: 1.0
  max: 2.0
"#;
        let generators: Vec<GeneratorConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(generators[0], GeneratorConfig::Sequential { start: 10 });
        assert!(matches!(
            generators[1],
            GeneratorConfig::FloatRange { min, max } if min == 0.1 && max == 3.0
        ));
        assert!(matches!(&generators[2], GeneratorConfig::OneOf { values } if values.len() == 2));
        assert!(matches!(generators[3], GeneratorConfig::DecimalRange { scale: 2, .. }));
    }

    #[test]
    fn test_resolve_by_category() {
        let yaml = r#"
type: by_category
cases:
  - value: light
    generator: {type: float_range, min: 0.1, max: 3.0}
  - value: heavy
    generator: {type: float_range, min: 6.0, max: 9.9}
default:
  type: static
  value: 4.5
"#;
        let generator: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();

        let light = Value::from("light");
        assert!(matches!(
            generator.resolve(Some(&light)),
            Some(GeneratorConfig::FloatRange { min, .. }) if *min == 0.1
        ));

        let medium = Value::from("medium");
        assert_eq!(
            generator.resolve(Some(&medium)),
            Some(&GeneratorConfig::Static {
                value: Value::Float(4.5)
            })
        );
        assert!(matches!(
            generator.resolve(None),
            Some(GeneratorConfig::Static { .. })
        ));
    }

    #[test]
    fn test_validate_float_bounds() {
        let yaml = r#"
- type: float_range
  min: 0.0
  max: .inf
- type: decimal_range
  min: .nan
  max: 1.0
- type: by_category
  cases:
    - value: heavy
      generator: {type: float_range, min: -.inf, max: 9.9}
- type: float_range
  min: -1.7e308
  max: 1.7e308
- type: by_category
  cases:
    - value: light
      generator: {type: float_range, min: 0.1, max: 3.0}
  default: {type: decimal_range, min: 1.0, max: 2.0}
"#;
        let generators: Vec<GeneratorConfig> = serde_yaml::from_str(yaml).unwrap();
        assert!(generators[0].validate().is_err());
        assert!(generators[1].validate().is_err());
        assert!(generators[2]
            .validate()
            .unwrap_err()
            .starts_with("case 'heavy'"));
        assert!(generators[3].validate().is_err());
        assert!(generators[4].validate().is_ok());
        assert!(GeneratorConfig::Null.validate().is_ok());
    }

    #[test]
    fn test_resolve_without_default() {
        let generator = GeneratorConfig::ByCategory {
            cases: vec![],
            default: None,
        };
        assert!(generator.resolve(Some(&Value::from("x"))).is_none());
        assert_eq!(
            GeneratorConfig::Null.resolve(None),
            Some(&GeneratorConfig::Null)
        );
    }
}
