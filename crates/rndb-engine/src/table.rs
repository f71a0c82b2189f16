//! Table declarations and migrated tables.
//!
//! A [`TableSchema`] is an ordered list of [`Column`]s plus associations to
//! other tables. Migrating it against a size produces a [`Table`]: the
//! category partitions of every categorical column, computed once and kept
//! for the lifetime of the session.

use crate::error::{Error, Result};
use crate::generators::Derivation;
use crate::interval_set::IntervalSet;
use crate::partition::{subdivide, ColumnPartition};
use rndb_core::{
    Association, ColumnDefinition, Constraints, Distribution, TableDefinition, Value, Weights,
};
use tracing::debug;

/// Name of the implicit identifier attribute.
pub const ID_ATTRIBUTE: &str = "id";

/// Label under which samples are seeded; not available as a column name.
pub const SAMPLE_LABEL: &str = "sample";

/// Largest table size; identifiers must fit a signed 64-bit integer.
pub const MAX_TABLE_SIZE: u64 = i64::MAX as u64;

/// One attribute of a table.
///
/// A column has a distribution, a derivation, or both. With only a
/// distribution its value is the record's category; with a derivation the
/// value is derived, receiving the category when there is one.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    distribution: Option<Distribution>,
    derivation: Option<Derivation>,
}

impl Column {
    /// Declare a column with neither distribution nor derivation yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distribution: None,
            derivation: None,
        }
    }

    /// Set the categorical distribution.
    pub fn with_distribution(mut self, distribution: impl Into<Distribution>) -> Self {
        self.distribution = Some(distribution.into());
        self
    }

    /// Set the derivation.
    pub fn with_derivation(mut self, derivation: impl Into<Derivation>) -> Self {
        self.derivation = Some(derivation.into());
        self
    }

    /// Build a column from its schema-file definition.
    pub fn from_definition(definition: &ColumnDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            distribution: definition.distribution.clone(),
            derivation: definition.generator.clone().map(Derivation::from),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_ref()
    }

    pub fn derivation(&self) -> Option<&Derivation> {
        self.derivation.as_ref()
    }
}

/// Declaration of a table: its columns in declaration order and its
/// associations.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
    associations: Vec<Association>,
}

impl TableSchema {
    /// Start declaring a table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Append a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Append an association.
    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// Build a table declaration from its schema-file definition.
    pub fn from_definition(definition: &TableDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            columns: definition.columns.iter().map(Column::from_definition).collect(),
            associations: definition.associations.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Get an association by name.
    pub fn get_association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|association| association.name == name)
    }

    /// Position of a column in declaration order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Check the declaration before migration.
    ///
    /// Distribution probabilities are checked during migration, where the
    /// columns a conditional distribution depends on are known.
    pub fn validate(&self) -> Result<()> {
        for (idx, column) in self.columns.iter().enumerate() {
            if column.name.is_empty() {
                return Err(self.invalid_column(column, "column name is empty"));
            }
            if column.name == ID_ATTRIBUTE {
                return Err(self.invalid_column(column, "'id' is reserved for the identifier"));
            }
            if column.name == SAMPLE_LABEL {
                return Err(self.invalid_column(column, "'sample' is reserved for sampling"));
            }
            if column.distribution.is_none() && column.derivation.is_none() {
                return Err(self.invalid_column(column, "needs a distribution or a derivation"));
            }
            if let Some(config) = column.derivation.as_ref().and_then(Derivation::config) {
                config
                    .validate()
                    .map_err(|reason| self.invalid_column(column, &reason))?;
            }
            if self.columns[..idx].iter().any(|other| other.name == column.name) {
                return Err(Error::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn invalid_column(&self, column: &Column, reason: &str) -> Error {
        Error::InvalidColumn {
            table: self.name.clone(),
            column: column.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// A migrated table.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    size: u64,
    /// One partition per column, aligned with `schema.columns`
    partitions: Vec<ColumnPartition>,
}

impl Table {
    /// Partition the identifier space `[0, size)` across every categorical
    /// column of `schema`.
    ///
    /// Columns are migrated in declaration order. Each categorical column
    /// subdivides the intervals the previous categorical column produced, so
    /// the partitions of different columns are interleaved rather than
    /// aligned. Conditional distributions split only the records matching
    /// each context; records matching no context keep no category and are
    /// carried forward unchanged.
    pub fn migrate(schema: TableSchema, size: u64) -> Result<Self> {
        schema.validate()?;
        if size > MAX_TABLE_SIZE {
            return Err(Error::TableTooLarge {
                table: schema.name.clone(),
                size,
            });
        }

        let mut table = Self {
            schema,
            size,
            partitions: Vec::new(),
        };
        let mut working = IntervalSet::full(size);

        for idx in 0..table.schema.columns.len() {
            let column = &table.schema.columns[idx];
            let (partition, remainder) = match &column.distribution {
                None => (ColumnPartition::new(), None),
                Some(Distribution::Flat(weights)) => {
                    table.check_weights(column, weights)?;
                    (flat_partition(&working, weights)?, Some(IntervalSet::new()))
                }
                Some(Distribution::Conditional(contexts)) => {
                    let mut partition = ColumnPartition::new();
                    let mut covered = IntervalSet::new();
                    for context in contexts {
                        table.check_weights(column, &context.distribution)?;
                        table.check_context(column, &context.when)?;
                        // Earlier contexts win where predicates overlap
                        let matched = table
                            .select(&context.when)?
                            .intersect(&working)
                            .difference(&covered);
                        covered = covered.disjoint_union(&matched)?;
                        for (value, ids) in subdivide(&matched, &context.distribution) {
                            partition.assign(value, ids)?;
                        }
                    }
                    let remainder = working.difference(&covered);
                    (partition, Some(remainder))
                }
            };

            if let Some(remainder) = remainder {
                debug!(
                    table = %table.schema.name,
                    column = %column.name,
                    categories = partition.len(),
                    assigned = partition.count(),
                    unassigned = remainder.count(),
                    "Partitioned column"
                );
                working = partition.covered()?.disjoint_union(&remainder)?;
            }
            table.partitions.push(partition);
        }

        Ok(table)
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Number of records; identifiers are `0..size`.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Every identifier of the table.
    pub fn all(&self) -> IntervalSet {
        IntervalSet::full(self.size)
    }

    /// Whether `id` identifies a record.
    pub fn contains(&self, id: u64) -> bool {
        id < self.size
    }

    /// Partition of a categorical column.
    pub fn partition(&self, column: &str) -> Option<&ColumnPartition> {
        self.schema
            .column_index(column)
            .and_then(|idx| self.partitions.get(idx))
    }

    /// The category of record `id` for `column`.
    pub fn category(&self, column: &str, id: u64) -> Option<&Value> {
        self.partition(column)
            .and_then(|partition| partition.category_of(id))
    }

    /// Whether `attribute` can be read from records of this table.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        attribute == ID_ATTRIBUTE || self.schema.get_column(attribute).is_some()
    }

    /// Fail with a lookup error unless `attribute` is readable.
    pub fn check_attribute(&self, attribute: &str) -> Result<()> {
        if self.has_attribute(attribute) {
            Ok(())
        } else {
            Err(Error::UnknownAttribute {
                table: self.name().to_string(),
                attribute: attribute.to_string(),
            })
        }
    }

    /// Identifiers satisfying every constraint.
    ///
    /// Each constrained attribute contributes the identifiers assigned to any
    /// of its listed values; the contributions are intersected. A constraint
    /// on `id` selects those identifiers. Columns without a distribution
    /// have no categories, so constraining them selects nothing.
    pub fn select(&self, constraints: &Constraints) -> Result<IntervalSet> {
        let mut selected = self.all();
        for (attribute, values) in constraints.iter() {
            if attribute == ID_ATTRIBUTE {
                let ids = values
                    .iter()
                    .filter_map(Value::as_u64)
                    .filter(|id| self.contains(*id));
                selected = selected.intersect(&IntervalSet::from_ids(ids));
                continue;
            }

            let idx = self
                .schema
                .column_index(attribute)
                .ok_or_else(|| Error::UnknownAttribute {
                    table: self.name().to_string(),
                    attribute: attribute.to_string(),
                })?;

            let mut matched = IntervalSet::new();
            if let Some(partition) = self.partitions.get(idx) {
                for (position, value) in values.iter().enumerate() {
                    if values[..position].contains(value) {
                        continue;
                    }
                    if let Some(ids) = partition.get(value) {
                        matched = matched.disjoint_union(ids)?;
                    }
                }
            }
            selected = selected.intersect(&matched);
        }
        Ok(selected)
    }

    fn check_weights(&self, column: &Column, weights: &Weights) -> Result<()> {
        weights.validate().map_err(|reason| Error::InvalidDistribution {
            table: self.name().to_string(),
            column: column.name.clone(),
            reason,
        })
    }

    /// Context predicates may only constrain `id` and columns already migrated.
    fn check_context(&self, column: &Column, when: &Constraints) -> Result<()> {
        for (attribute, _) in when.iter() {
            let migrated = attribute == ID_ATTRIBUTE
                || self
                    .schema
                    .column_index(attribute)
                    .is_some_and(|idx| idx < self.partitions.len());
            if !migrated {
                return Err(Error::InvalidDistribution {
                    table: self.name().to_string(),
                    column: column.name.clone(),
                    reason: format!(
                        "context constrains '{attribute}', which is not declared before this column"
                    ),
                });
            }
        }
        Ok(())
    }
}

fn flat_partition(working: &IntervalSet, weights: &Weights) -> Result<ColumnPartition> {
    let mut partition = ColumnPartition::new();
    for (value, ids) in subdivide(working, weights) {
        partition.assign(value, ids)?;
    }
    Ok(partition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rndb_core::{ConditionalWeights, GeneratorConfig};

    fn colour() -> Column {
        Column::new("colour").with_distribution(Distribution::flat([
            ("red", 0.3),
            ("green", 0.1),
            ("brown", 0.01),
            ("blue", 0.5),
            ("orange", 0.09),
        ]))
    }

    fn transparent() -> Column {
        Column::new("transparent").with_distribution(Distribution::flat([(true, 0.1), (false, 0.9)]))
    }

    fn ball() -> TableSchema {
        TableSchema::new("ball").column(colour()).column(transparent())
    }

    #[test]
    fn test_migrate_flat_columns() {
        let table = Table::migrate(ball(), 1_000_000).unwrap();
        assert_eq!(table.size(), 1_000_000);

        let colours = table.partition("colour").unwrap();
        assert_eq!(colours.count(), 1_000_000);
        assert_eq!(
            colours.get(&Value::from("red")).map(IntervalSet::count),
            Some(300_000)
        );

        let transparent = table.partition("transparent").unwrap();
        assert_eq!(transparent.count(), 1_000_000);
        assert_eq!(
            transparent.get(&Value::Bool(true)).map(IntervalSet::count),
            Some(100_000)
        );
    }

    #[test]
    fn test_chained_layout() {
        let table = Table::migrate(ball(), 1_000_000).unwrap();
        // Each colour interval is split again by transparency
        assert_eq!(table.category("transparent", 0), Some(&Value::Bool(true)));
        assert_eq!(table.category("transparent", 29_999), Some(&Value::Bool(true)));
        assert_eq!(table.category("transparent", 30_000), Some(&Value::Bool(false)));
        assert_eq!(table.category("transparent", 300_000), Some(&Value::Bool(true)));
        assert_eq!(table.category("colour", 300_000), Some(&Value::from("green")));
        assert_eq!(table.category("colour", 1_000_000), None);
    }

    #[test]
    fn test_select() {
        let table = Table::migrate(ball(), 1_000_000).unwrap();

        let red = table
            .select(&Constraints::new().with("colour", "red"))
            .unwrap();
        assert_eq!(red.count(), 300_000);

        let red_or_blue = table
            .select(&Constraints::new().with_any("colour", ["red", "blue", "red"]))
            .unwrap();
        assert_eq!(red_or_blue.count(), 800_000);

        let clear_green = table
            .select(
                &Constraints::new()
                    .with("colour", "green")
                    .with("transparent", true),
            )
            .unwrap();
        assert_eq!(clear_green.count(), 10_000);
        assert_eq!(clear_green.first(), Some(300_000));

        let none = table
            .select(&Constraints::new().with("colour", "purple"))
            .unwrap();
        assert!(none.is_empty());

        assert_eq!(table.select(&Constraints::new()).unwrap(), table.all());
    }

    #[test]
    fn test_select_by_id() {
        let table = Table::migrate(ball(), 100).unwrap();
        let ids = table
            .select(&Constraints::new().with_any("id", [3u64, 5, 500]))
            .unwrap();
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn test_select_unknown_attribute() {
        let table = Table::migrate(ball(), 100).unwrap();
        let err = table
            .select(&Constraints::new().with("size", "large"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_conditional_distribution() {
        let rarity = Column::new("rarity").with_distribution(Distribution::Conditional(vec![
            ConditionalWeights {
                when: Constraints::new().with("colour", "red"),
                distribution: Weights::new().with("common", 0.9).with("rare", 0.1),
            },
            ConditionalWeights {
                when: Constraints::new().with("colour", "blue"),
                distribution: Weights::new().with("common", 0.5).with("rare", 0.5),
            },
        ]));
        let table = Table::migrate(ball().column(rarity), 1_000_000).unwrap();

        let rarity = table.partition("rarity").unwrap();
        assert_eq!(
            rarity.get(&Value::from("rare")).map(IntervalSet::count),
            Some(30_000 + 250_000)
        );
        assert_eq!(rarity.count(), 800_000);
        // Green records match no context
        assert_eq!(table.category("rarity", 300_000), None);

        let rare_red = table
            .select(&Constraints::new().with("colour", "red").with("rarity", "rare"))
            .unwrap();
        assert_eq!(rare_red.count(), 30_000);
    }

    #[test]
    fn test_conditional_context_must_precede() {
        let rarity = Column::new("rarity").with_distribution(Distribution::Conditional(vec![
            ConditionalWeights {
                when: Constraints::new().with("shine", "matte"),
                distribution: Weights::new().with("common", 1.0),
            },
        ]));
        let shine = Column::new("shine").with_distribution(Distribution::flat([("matte", 1.0)]));
        let err = Table::migrate(ball().column(rarity).column(shine), 10).unwrap_err();
        assert!(matches!(err, Error::InvalidDistribution { .. }));
    }

    #[test]
    fn test_invalid_distribution() {
        let schema = TableSchema::new("ball").column(
            Column::new("colour").with_distribution(Distribution::flat([("red", 0.3), ("blue", 0.5)])),
        );
        let err = Table::migrate(schema, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidDistribution { ref column, .. } if column == "colour"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_validate_columns() {
        let duplicate = ball().column(colour());
        assert!(matches!(
            duplicate.validate(),
            Err(Error::DuplicateColumn { .. })
        ));

        let bare = ball().column(Column::new("weight"));
        assert!(matches!(bare.validate(), Err(Error::InvalidColumn { .. })));

        let reserved = ball().column(Column::new("id").with_derivation(GeneratorConfig::Null));
        assert!(matches!(reserved.validate(), Err(Error::InvalidColumn { .. })));

        let sample = ball().column(Column::new("sample").with_derivation(GeneratorConfig::Null));
        assert!(matches!(sample.validate(), Err(Error::InvalidColumn { .. })));

        let unbounded = ball().column(
            Column::new("weight").with_derivation(GeneratorConfig::FloatRange {
                min: 0.0,
                max: f64::INFINITY,
            }),
        );
        let Err(Error::InvalidColumn { column, reason, .. }) = unbounded.validate() else {
            panic!("Expected InvalidColumn for an unbounded float range");
        };
        assert_eq!(column, "weight");
        assert!(reason.contains("not finite"));

        let unbounded_case = ball().column(Column::new("weight").with_derivation(
            GeneratorConfig::ByCategory {
                cases: vec![rndb_core::CategoryCase {
                    value: Value::from("red"),
                    generator: GeneratorConfig::DecimalRange {
                        min: f64::NAN,
                        max: 1.0,
                        scale: 2,
                    },
                }],
                default: None,
            },
        ));
        assert!(matches!(
            unbounded_case.validate(),
            Err(Error::InvalidColumn { .. })
        ));

        let closure = ball().column(Column::new("weight").with_derivation(Derivation::new(
            |_, _, _| Value::Float(f64::INFINITY),
        )));
        assert!(closure.validate().is_ok());

        assert!(ball().validate().is_ok());
    }

    #[test]
    fn test_derived_column_has_no_partition() {
        let schema = ball().column(
            Column::new("weight").with_derivation(GeneratorConfig::FloatRange { min: 0.1, max: 9.9 }),
        );
        let table = Table::migrate(schema, 100).unwrap();
        assert!(table.partition("weight").unwrap().is_empty());
        assert!(table
            .select(&Constraints::new().with("weight", 1.0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_size_beyond_identifier_range() {
        assert!(matches!(
            Table::migrate(ball(), MAX_TABLE_SIZE + 1),
            Err(Error::TableTooLarge { size, .. }) if size == MAX_TABLE_SIZE + 1
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::migrate(ball(), 0).unwrap();
        assert_eq!(table.all().count(), 0);
        assert_eq!(table.partition("colour").unwrap().count(), 0);
    }

    #[test]
    fn test_from_definition() {
        let yaml = r#"
name: ball
size: 10
columns:
  - name: colour
    distribution:
      red: 0.5
      blue: 0.5
  - name: serial
    generator:
      type: sequential
      start: 1000
"#;
        let definition: TableDefinition = serde_yaml::from_str(yaml).unwrap();
        let schema = TableSchema::from_definition(&definition);
        assert_eq!(schema.name(), "ball");
        assert_eq!(schema.columns().len(), 2);
        assert!(schema.get_column("serial").unwrap().derivation().is_some());
        assert!(schema.get_column("colour").unwrap().distribution().is_some());
    }
}
