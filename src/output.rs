//! Record output as JSON lines.

use rndb_core::Value;
use rndb_engine::Record;
use std::collections::BTreeMap;
use std::io::Write;

/// Every attribute of a record as a JSON object.
pub fn record_json(record: Record<'_>) -> anyhow::Result<String> {
    Ok(serde_json::to_string(&record.into_attributes()?)?)
}

/// Selected attributes of a record as a JSON object.
pub fn attributes_json(record: &mut Record<'_>, attributes: &[&str]) -> anyhow::Result<String> {
    let mut row = BTreeMap::new();
    for attribute in attributes {
        row.insert(attribute.to_string(), record.get(attribute)?);
    }
    Ok(serde_json::to_string(&row)?)
}

/// Write records as JSON lines, returning how many were written.
///
/// With no `attributes` every column is written.
pub fn write_records<'s>(
    out: &mut impl Write,
    records: impl Iterator<Item = Record<'s>>,
    attributes: &[&str],
) -> anyhow::Result<usize> {
    let mut written = 0;
    for mut record in records {
        let line = if attributes.is_empty() {
            record_json(record)?
        } else {
            attributes_json(&mut record, attributes)?
        };
        writeln!(out, "{line}")?;
        written += 1;
    }
    Ok(written)
}

/// Write values one per line, strings unquoted.
pub fn write_values(out: &mut impl Write, values: &[Value]) -> anyhow::Result<()> {
    for value in values {
        writeln!(out, "{value}")?;
    }
    Ok(())
}
