//! Parsing of constraint, value and override arguments.

use anyhow::Context;
use rndb_core::{Constraints, Value};
use std::str::FromStr;

/// Parse a scalar value as YAML would: `true`, `12`, `0.5`, `null`, else a string.
pub fn parse_value(raw: &str) -> Value {
    serde_yaml::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

/// Parse `attribute=value[,value...]` arguments into constraints.
pub fn parse_constraints<S: AsRef<str>>(raw: &[S]) -> anyhow::Result<Constraints> {
    let mut constraints = Constraints::new();
    for arg in raw {
        let arg = arg.as_ref();
        let (attribute, values) = arg
            .split_once('=')
            .with_context(|| format!("Invalid constraint '{arg}': expected 'attribute=value'"))?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            anyhow::bail!("Invalid constraint '{arg}': attribute is empty");
        }
        constraints = constraints.with_any(
            attribute,
            values.split(',').map(|value| parse_value(value.trim())),
        );
    }
    Ok(constraints)
}

/// An override given on the command line as `table:id:attribute=value`.
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideArg {
    pub table: String,
    pub id: u64,
    pub attribute: String,
    pub value: Value,
}

impl FromStr for OverrideArg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .with_context(|| format!("Invalid override '{s}': expected 'table:id:attribute=value'"))?;
        let parts: Vec<&str> = target.splitn(3, ':').collect();
        if parts.len() != 3 {
            anyhow::bail!("Invalid override '{s}': expected 'table:id:attribute=value'");
        }
        Ok(Self {
            table: parts[0].to_string(),
            id: parts[1]
                .parse()
                .with_context(|| format!("Invalid identifier '{}' in override '{s}'", parts[1]))?,
            attribute: parts[2].to_string(),
            value: parse_value(value),
        })
    }
}
