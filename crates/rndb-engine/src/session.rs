//! Sessions: the lifetime of a seed, its migrated tables and its overrides.
//!
//! Only one session may be open per thread. Opening binds the seed; tables
//! are added (migrated) once and read any number of times. Attribute values
//! are derived on demand from the per-cell seed, so nothing but partitions
//! and overrides is stored.

use crate::error::{Error, Result};
use crate::interval_set::IntervalSet;
use crate::query::Query;
use crate::record::Record;
use crate::seeder::Seeder;
use crate::table::{Table, TableSchema, ID_ATTRIBUTE, SAMPLE_LABEL};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rndb_core::{Association, Constraints, OverrideMap, SchemaDefinition, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

/// Threads that currently hold an open session.
static OPEN_SESSIONS: Mutex<Vec<ThreadId>> = Mutex::new(Vec::new());

/// Marks the opening thread as holding a session until dropped.
#[derive(Debug)]
struct SessionGuard {
    thread: ThreadId,
}

impl SessionGuard {
    fn acquire() -> Result<Self> {
        let thread = thread::current().id();
        let mut open = OPEN_SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
        if open.contains(&thread) {
            return Err(Error::SessionAlreadyOpen);
        }
        open.push(thread);
        Ok(Self { thread })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut open = OPEN_SESSIONS.lock().unwrap_or_else(PoisonError::into_inner);
        open.retain(|thread| *thread != self.thread);
    }
}

/// An open session.
///
/// Reads take `&self` and may run from several threads; the shared
/// generator is locked for each reseed-and-derive step, so concurrent reads
/// serialize on it but always see a correctly seeded generator.
#[derive(Debug)]
pub struct Session {
    seeder: Seeder,
    rng: Mutex<StdRng>,
    tables: HashMap<String, Table>,
    /// Table names in the order they were added
    order: Vec<String>,
    overrides: OverrideMap,
    _guard: SessionGuard,
}

impl Session {
    /// Open a session bound to `seed`.
    ///
    /// Fails with [`Error::SessionAlreadyOpen`] while another session opened
    /// on this thread is alive.
    pub fn open(seed: u64) -> Result<Self> {
        let guard = SessionGuard::acquire()?;
        info!(seed, "Opened session");
        Ok(Self {
            seeder: Seeder::new(seed),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            tables: HashMap::new(),
            order: Vec::new(),
            overrides: OverrideMap::new(),
            _guard: guard,
        })
    }

    /// Open a session and migrate every table of a schema file.
    ///
    /// Every association target must be declared in the schema.
    pub fn from_schema(schema: &SchemaDefinition, seed: u64) -> Result<Self> {
        let mut session = Self::open(seed)?;
        for definition in &schema.tables {
            session.add_table(TableSchema::from_definition(definition), definition.size)?;
        }
        for definition in &schema.tables {
            for association in &definition.associations {
                if !session.tables.contains_key(&association.target) {
                    return Err(Error::UnknownAssociationTarget {
                        table: definition.name.clone(),
                        association: association.name.clone(),
                        target: association.target.clone(),
                    });
                }
            }
        }
        Ok(session)
    }

    /// The session seed.
    pub fn seed(&self) -> u64 {
        self.seeder.seed()
    }

    /// Migrate a table of `size` records.
    ///
    /// Associations between this table and tables already in the session
    /// are checked here; associations to tables added later are checked
    /// when those are added. On error the session is left unchanged.
    pub fn add_table(&mut self, schema: TableSchema, size: u64) -> Result<()> {
        let name = schema.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(Error::TableAlreadyMigrated(name));
        }

        let table = Table::migrate(schema, size)?;
        self.tables.insert(name.clone(), table);

        if let Err(err) = self.check_associations(&name) {
            self.tables.remove(&name);
            return Err(err);
        }

        self.order.push(name.clone());
        info!(
            table = %name,
            size,
            columns = self.tables[&name].schema().columns().len(),
            "Migrated table"
        );
        Ok(())
    }

    /// Handle to a migrated table.
    pub fn table(&self, name: &str) -> Result<TableRef<'_>> {
        let table = self
            .tables
            .get(name)
            .ok_or_else(|| Error::TableNotMigrated(name.to_string()))?;
        Ok(TableRef {
            session: self,
            table,
        })
    }

    /// Names of migrated tables, in the order they were added.
    pub fn table_names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Value of one attribute of one record, override first.
    pub fn value(&self, table: &str, id: u64, attribute: &str) -> Result<Value> {
        self.table(table)?.value(id, attribute)
    }

    /// Record an override; it wins over the derived value until reset.
    pub fn set_override(
        &mut self,
        table: &str,
        id: u64,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let target = self
            .tables
            .get(table)
            .ok_or_else(|| Error::TableNotMigrated(table.to_string()))?;
        if !target.contains(id) {
            return Err(Error::IdentifierOutOfRange {
                table: table.to_string(),
                id,
                size: target.size(),
            });
        }
        target.check_attribute(attribute)?;

        self.overrides
            .entry(table.to_string())
            .or_default()
            .entry(id)
            .or_default()
            .insert(attribute.to_string(), value.into());
        Ok(())
    }

    /// Overrides recorded for one record.
    pub fn overrides_for(&self, table: &str, id: u64) -> Option<&BTreeMap<String, Value>> {
        self.overrides.get(table).and_then(|records| records.get(&id))
    }

    /// Discard every override.
    pub fn reset(&mut self) {
        let count: usize = self.overrides.values().map(BTreeMap::len).sum();
        self.overrides.clear();
        info!(records = count, "Reset overrides");
    }

    /// All overrides, keyed table, then identifier, then attribute.
    pub fn dump(&self) -> &OverrideMap {
        &self.overrides
    }

    /// Merge overrides into the session; supplied values win.
    ///
    /// Entries that [`Session::set_override`] would reject are skipped with a
    /// warning: tables not migrated, identifiers outside the table and
    /// undeclared attributes.
    pub fn load(&mut self, overrides: OverrideMap) {
        let mut count = 0usize;
        let mut skipped = 0usize;
        for (table, records) in overrides {
            let Some(target) = self.tables.get(&table) else {
                warn!(table = %table, "Skipping overrides for a table that is not migrated");
                skipped += records.values().map(BTreeMap::len).sum::<usize>();
                continue;
            };
            let existing = self.overrides.entry(table.clone()).or_default();
            for (id, attributes) in records {
                if !target.contains(id) {
                    warn!(
                        table = %table,
                        id,
                        size = target.size(),
                        "Skipping override outside the table"
                    );
                    skipped += attributes.len();
                    continue;
                }
                let mut accepted = BTreeMap::new();
                for (attribute, value) in attributes {
                    if target.has_attribute(&attribute) {
                        accepted.insert(attribute, value);
                    } else {
                        warn!(
                            table = %table,
                            id,
                            attribute = %attribute,
                            "Skipping override of unknown attribute"
                        );
                        skipped += 1;
                    }
                }
                if !accepted.is_empty() {
                    count += 1;
                    existing.entry(id).or_default().extend(accepted);
                }
            }
            if existing.is_empty() {
                self.overrides.remove(&table);
            }
        }
        info!(records = count, skipped, "Loaded overrides");
    }

    /// Run `f` with the shared generator locked.
    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Derived value of one attribute, ignoring overrides.
    pub(crate) fn derive(&self, table: &Table, id: u64, attribute: &str) -> Result<Value> {
        if attribute == ID_ATTRIBUTE {
            return Ok(Value::from(id));
        }
        let column = table
            .schema()
            .get_column(attribute)
            .ok_or_else(|| Error::UnknownAttribute {
                table: table.name().to_string(),
                attribute: attribute.to_string(),
            })?;
        let category = table.category(attribute, id);

        match column.derivation() {
            Some(derivation) => Ok(self.with_rng(|rng| {
                self.seeder.reseed(rng, table.name(), attribute, id);
                derivation.derive(id, category, rng)
            })),
            None => Ok(category.cloned().unwrap_or(Value::Null)),
        }
    }

    /// Draw a reproducible sample of `ids`.
    pub(crate) fn sample(&self, table: &Table, ids: &IntervalSet, limit: u64) -> IntervalSet {
        self.with_rng(|rng| {
            self.seeder.reseed(rng, table.name(), SAMPLE_LABEL, limit);
            ids.sample(limit, rng)
        })
    }

    /// Check the cardinality of every association touching `name` whose
    /// two tables are both migrated.
    fn check_associations(&self, name: &str) -> Result<()> {
        for table in self.tables.values() {
            for association in table.schema().associations() {
                let touches = table.name() == name || association.target == name;
                if !touches {
                    continue;
                }
                if let Some(target) = self.tables.get(&association.target) {
                    check_cardinality(table, association, target)?;
                }
            }
        }
        Ok(())
    }

    /// Target record paired with `id` through `association`.
    pub(crate) fn join(
        &self,
        table: &Table,
        id: u64,
        association: &str,
    ) -> Result<Option<(&Table, u64)>> {
        let declared = table.schema().get_association(association).ok_or_else(|| {
            Error::UnknownAssociation {
                table: table.name().to_string(),
                association: association.to_string(),
            }
        })?;
        let target = self
            .tables
            .get(&declared.target)
            .ok_or_else(|| Error::TableNotMigrated(declared.target.clone()))?;

        for context in &declared.contexts {
            let sources = table.select(&context.source)?;
            if let Some(position) = sources.index_of(id) {
                let targets = target.select(&context.target)?;
                debug!(
                    table = %table.name(),
                    association,
                    id,
                    position,
                    "Resolved association context"
                );
                return Ok(targets.nth(position).map(|target_id| (target, target_id)));
            }
        }
        Ok(None)
    }
}

fn check_cardinality(table: &Table, association: &Association, target: &Table) -> Result<()> {
    for (idx, context) in association.contexts.iter().enumerate() {
        let source_count = table.select(&context.source)?.count();
        let target_count = target.select(&context.target)?.count();
        if source_count != target_count {
            return Err(Error::AssociationCardinality {
                table: table.name().to_string(),
                association: association.name.clone(),
                context: idx,
                source_count,
                target_count,
            });
        }
    }
    Ok(())
}

/// Read handle to one migrated table of a session.
#[derive(Debug, Clone, Copy)]
pub struct TableRef<'s> {
    session: &'s Session,
    table: &'s Table,
}

impl<'s> TableRef<'s> {
    pub(crate) fn new(session: &'s Session, table: &'s Table) -> Self {
        Self { session, table }
    }

    pub fn name(&self) -> &'s str {
        self.table.name()
    }

    /// Number of records.
    pub fn size(&self) -> u64 {
        self.table.size()
    }

    pub fn schema(&self) -> &'s TableSchema {
        self.table.schema()
    }

    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub(crate) fn table(&self) -> &'s Table {
        self.table
    }

    /// Every record.
    pub fn all(&self) -> Query<'s> {
        Query::new(*self, self.table.all())
    }

    /// Records satisfying every constraint.
    pub fn filter(&self, constraints: &Constraints) -> Result<Query<'s>> {
        Ok(Query::new(*self, self.table.select(constraints)?))
    }

    /// Number of records satisfying every constraint.
    pub fn count(&self, constraints: &Constraints) -> Result<u64> {
        Ok(self.table.select(constraints)?.count())
    }

    /// Record by identifier.
    pub fn get(&self, id: u64) -> Result<Record<'s>> {
        self.check_id(id)?;
        Ok(Record::new(*self, id))
    }

    /// Record with the smallest identifier.
    pub fn first(&self) -> Option<Record<'s>> {
        self.all().first()
    }

    /// Record with the largest identifier.
    pub fn last(&self) -> Option<Record<'s>> {
        self.all().last()
    }

    /// Reproducible sample of up to `limit` distinct records.
    pub fn sample(&self, limit: u64) -> Query<'s> {
        self.all().sample(limit)
    }

    /// Value of one attribute of one record, override first.
    pub fn value(&self, id: u64, attribute: &str) -> Result<Value> {
        self.check_id(id)?;
        self.table.check_attribute(attribute)?;
        if let Some(value) = self
            .session
            .overrides_for(self.name(), id)
            .and_then(|attributes| attributes.get(attribute))
        {
            return Ok(value.clone());
        }
        self.session.derive(self.table, id, attribute)
    }

    /// Record paired with `id` through `association`, if any context matches.
    pub fn join(&self, id: u64, association: &str) -> Result<Option<Record<'s>>> {
        self.check_id(id)?;
        let joined = self.session.join(self.table, id, association)?;
        Ok(joined.map(|(target, target_id)| Record::new(TableRef::new(self.session, target), target_id)))
    }

    fn check_id(&self, id: u64) -> Result<()> {
        if self.table.contains(id) {
            Ok(())
        } else {
            Err(Error::IdentifierOutOfRange {
                table: self.name().to_string(),
                id,
                size: self.size(),
            })
        }
    }
}
