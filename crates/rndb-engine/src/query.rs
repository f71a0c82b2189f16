//! Lazy query results.
//!
//! A [`Query`] is an interval set of matching identifiers bound to a table.
//! Counting, positional access and further filtering work on the intervals
//! alone; records and their attribute values are only produced when read.

use crate::error::{Error, Result};
use crate::interval_set::IntervalSet;
use crate::record::Record;
use crate::session::TableRef;
use rand::Rng;
use rndb_core::{Constraints, Value};
use std::collections::BTreeMap;

/// Identifiers of one table matching a set of constraints.
#[derive(Debug, Clone)]
pub struct Query<'s> {
    table: TableRef<'s>,
    ids: IntervalSet,
}

impl<'s> Query<'s> {
    pub(crate) fn new(table: TableRef<'s>, ids: IntervalSet) -> Self {
        Self { table, ids }
    }

    /// The table queried.
    pub fn table(&self) -> TableRef<'s> {
        self.table
    }

    /// Matching identifiers.
    pub fn ids(&self) -> &IntervalSet {
        &self.ids
    }

    /// Number of matching records.
    pub fn count(&self) -> u64 {
        self.ids.count()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether record `id` matches.
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(id)
    }

    /// Record at a position in identifier order; negative positions count
    /// from the end.
    pub fn get(&self, index: i64) -> Option<Record<'s>> {
        self.ids.at(index).map(|id| Record::new(self.table, id))
    }

    /// Like [`Query::get`], failing with a bounds error instead of `None`.
    pub fn at(&self, index: i64) -> Result<Record<'s>> {
        self.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            count: self.count(),
        })
    }

    pub fn first(&self) -> Option<Record<'s>> {
        self.get(0)
    }

    pub fn last(&self) -> Option<Record<'s>> {
        self.get(-1)
    }

    /// Matching records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = Record<'s>> + '_ {
        let table = self.table;
        self.ids.iter().map(move |id| Record::new(table, id))
    }

    /// Matching records that also satisfy `constraints`.
    pub fn filter(&self, constraints: &Constraints) -> Result<Query<'s>> {
        let selected = self.table.table().select(constraints)?;
        Ok(Self::new(self.table, self.ids.intersect(&selected)))
    }

    /// One attribute of every matching record, in identifier order.
    pub fn pluck(&self, attribute: &str) -> Result<Vec<Value>> {
        self.table.table().check_attribute(attribute)?;
        self.iter().map(|mut record| record.get(attribute)).collect()
    }

    /// Several attributes of every matching record, in identifier order.
    pub fn pluck_many(&self, attributes: &[&str]) -> Result<Vec<BTreeMap<String, Value>>> {
        for attribute in attributes {
            self.table.table().check_attribute(attribute)?;
        }
        let mut rows = Vec::new();
        for mut record in self.iter() {
            let mut row = BTreeMap::new();
            for attribute in attributes {
                row.insert(attribute.to_string(), record.get(attribute)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Up to `limit` distinct matching records, chosen reproducibly.
    ///
    /// The same query sampled with the same limit in a session with the
    /// same seed yields the same records.
    pub fn sample(&self, limit: u64) -> Query<'s> {
        let ids = self
            .table
            .session()
            .sample(self.table.table(), &self.ids, limit);
        Self::new(self.table, ids)
    }

    /// Up to `limit` distinct matching records, drawn from `rng`.
    pub fn sample_with<R: Rng + ?Sized>(&self, limit: u64, rng: &mut R) -> Query<'s> {
        Self::new(self.table, self.ids.sample(limit, rng))
    }
}

impl<'q, 's> IntoIterator for &'q Query<'s> {
    type Item = Record<'s>;
    type IntoIter = Box<dyn Iterator<Item = Record<'s>> + 'q>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::session::Session;
    use crate::table::{Column, TableSchema};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rndb_core::{Distribution, GeneratorConfig};

    fn session() -> Session {
        let mut session = Session::open(11).unwrap();
        session
            .add_table(
                TableSchema::new("ball")
                    .column(Column::new("colour").with_distribution(Distribution::flat([
                        ("red", 0.3),
                        ("green", 0.2),
                        ("blue", 0.5),
                    ])))
                    .column(
                        Column::new("serial")
                            .with_derivation(GeneratorConfig::Sequential { start: 1000 }),
                    ),
                100,
            )
            .unwrap();
        session
    }

    #[test]
    fn test_positional_access() {
        let session = session();
        let ball = session.table("ball").unwrap();
        let green = ball
            .filter(&Constraints::new().with("colour", "green"))
            .unwrap();

        assert_eq!(green.count(), 20);
        assert_eq!(green.first().unwrap().id(), 30);
        assert_eq!(green.last().unwrap().id(), 49);
        assert_eq!(green.get(5).unwrap().id(), 35);
        assert_eq!(green.get(-2).unwrap().id(), 48);
        assert!(green.get(20).is_none());

        let err = green.at(20).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert!(matches!(err, Error::IndexOutOfBounds { index: 20, count: 20 }));
    }

    #[test]
    fn test_refine() {
        let session = session();
        let ball = session.table("ball").unwrap();
        let warm = ball
            .filter(&Constraints::new().with_any("colour", ["red", "green"]))
            .unwrap();
        assert_eq!(warm.count(), 50);

        let red = warm.filter(&Constraints::new().with("colour", "red")).unwrap();
        assert_eq!(red.count(), 30);
        let none = red.filter(&Constraints::new().with("colour", "blue")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_pluck() {
        let session = session();
        let ball = session.table("ball").unwrap();
        let green = ball
            .filter(&Constraints::new().with("colour", "green"))
            .unwrap();

        let serials = green.pluck("serial").unwrap();
        assert_eq!(serials.len(), 20);
        assert_eq!(serials[0], Value::Int(1030));

        let rows = green.pluck_many(&["id", "colour"]).unwrap();
        assert_eq!(rows[0]["id"], Value::Int(30));
        assert_eq!(rows[0]["colour"], Value::from("green"));

        assert!(green.pluck("size").is_err());
    }

    #[test]
    fn test_lazy_iteration() {
        let session = session();
        let ball = session.table("ball").unwrap();
        let found = ball
            .all()
            .iter()
            .find(|record| record.id() > 40)
            .map(|record| record.id());
        assert_eq!(found, Some(41));

        let mut visited = 0;
        for record in &ball.all() {
            assert!(record.id() < 100);
            visited += 1;
        }
        assert_eq!(visited, 100);
    }

    #[test]
    fn test_sample_is_reproducible() {
        let session = session();
        let ball = session.table("ball").unwrap();
        let all = ball.all();

        let a = all.sample(10);
        let b = all.sample(10);
        assert_eq!(a.count(), 10);
        assert_eq!(a.ids(), b.ids());
        assert!(a.ids().iter().all(|id| all.contains(id)));

        assert_eq!(all.sample(1000).count(), 100);

        let mut rng = StdRng::seed_from_u64(3);
        let c = all.sample_with(10, &mut rng);
        assert_eq!(c.count(), 10);
    }
}
