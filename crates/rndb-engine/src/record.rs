//! Records: one identifier of a table with memoized attribute values.

use crate::error::Result;
use crate::session::TableRef;
use crate::table::ID_ATTRIBUTE;
use rndb_core::Value;
use std::collections::BTreeMap;

/// One record of a migrated table.
///
/// Attribute values are computed on first access and memoized. Overrides
/// recorded when the record is created take precedence over derived values.
#[derive(Debug, Clone)]
pub struct Record<'s> {
    table: TableRef<'s>,
    id: u64,
    cache: BTreeMap<String, Value>,
}

impl<'s> Record<'s> {
    pub(crate) fn new(table: TableRef<'s>, id: u64) -> Self {
        let mut cache = BTreeMap::new();
        cache.insert(ID_ATTRIBUTE.to_string(), Value::from(id));
        if let Some(overrides) = table.session().overrides_for(table.name(), id) {
            cache.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Self { table, id, cache }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The table this record belongs to.
    pub fn table(&self) -> TableRef<'s> {
        self.table
    }

    /// Value of one attribute.
    pub fn get(&mut self, attribute: &str) -> Result<Value> {
        self.table.table().check_attribute(attribute)?;
        if let Some(value) = self.cache.get(attribute) {
            return Ok(value.clone());
        }
        let value = self
            .table
            .session()
            .derive(self.table.table(), self.id, attribute)?;
        self.cache.insert(attribute.to_string(), value.clone());
        Ok(value)
    }

    /// Every column value plus `id`.
    pub fn attributes(&mut self) -> Result<&BTreeMap<String, Value>> {
        let schema = self.table.schema();
        for column in schema.columns() {
            self.get(column.name())?;
        }
        Ok(&self.cache)
    }

    /// Consume the record, returning every column value plus `id`.
    pub fn into_attributes(mut self) -> Result<BTreeMap<String, Value>> {
        self.attributes()?;
        Ok(self.cache)
    }

    /// Record paired with this one through `association`.
    pub fn join(&self, association: &str) -> Result<Option<Record<'s>>> {
        self.table.join(self.id, association)
    }
}
