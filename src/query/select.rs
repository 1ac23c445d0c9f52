//! Query description
//!
//! A `Select` pairs an optional condition tree with an optional sort order
//! and an offset/limit window. It stays a plain value: execution happens
//! through [`DB::query`](crate::db::DB::query) and
//! [`DB::count`](crate::db::DB::count).

use crate::bitset::{BitSet, BitSetPool};
use crate::db::DB;
use crate::error::Result;

use super::condition::Condition;

/// Sort direction over the composite key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Sort key: named sortable fields plus a direction
#[derive(Clone, Debug)]
pub struct Order {
    fields: Vec<String>,
    direction: Direction,
}

impl Order {
    pub(crate) fn fields(&self) -> &[String] {
        &self.fields
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }
}

/// Ascending order over the named sortable fields
pub fn asc<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Order {
    Order {
        fields: fields.into_iter().map(Into::into).collect(),
        direction: Direction::Asc,
    }
}

/// Descending order over the named sortable fields
pub fn desc<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Order {
    Order {
        fields: fields.into_iter().map(Into::into).collect(),
        direction: Direction::Desc,
    }
}

/// A query: optional condition, optional order, offset/limit window
///
/// `limit` of zero means unlimited.
#[derive(Clone, Debug, Default)]
pub struct Select {
    condition: Option<Condition>,
    order_by: Option<Order>,
    offset: usize,
    limit: usize,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to documents satisfying `condition`
    pub fn where_(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Emit documents in `order` instead of ascending id order
    pub fn order_by(mut self, order: Order) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Skip the first `offset` matching documents
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Deliver at most `limit` documents; zero means unlimited
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub(crate) fn order(&self) -> Option<&Order> {
        self.order_by.as_ref()
    }

    pub(crate) fn skip(&self) -> usize {
        self.offset
    }

    pub(crate) fn limit_value(&self) -> usize {
        self.limit
    }

    /// The query mask before offset/limit: `None` when the condition is
    /// unsatisfiable, the ones-sentinel when there is no condition
    pub(crate) fn filtered_unlimited(&self, db: &DB) -> Result<Option<BitSet>> {
        let doc_count = db.documents_count();
        match &self.condition {
            None => Ok(Some(BitSet::AllOnes(doc_count))),
            Some(condition) => {
                let mut bits = BitSetPool::acquire(db.pool(), doc_count);
                if !condition.apply(db, &mut bits)? {
                    // Guard drop releases the bits.
                    return Ok(None);
                }
                Ok(Some(BitSet::Dense(bits)))
            }
        }
    }

    pub(crate) fn count(&self, db: &DB) -> Result<usize> {
        let Some(mask) = self.filtered_unlimited(db)? else {
            return Ok(0);
        };
        let count = mask.cardinality().saturating_sub(self.offset);
        if self.limit > 0 {
            return Ok(count.min(self.limit));
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::condition::eq;
    use crate::format::{read_db, DatabaseBuilder, DocumentBuilder};

    // Six documents: kind a {0, 1, 2, 3}, b {4, 5}.
    fn test_db() -> DB {
        let mut builder = DatabaseBuilder::new();
        for kind in ["a", "a", "a", "a", "b", "b"] {
            builder.document(DocumentBuilder::new().filterable("kind", kind));
        }
        read_db(builder.build().unwrap().as_slice()).unwrap()
    }

    #[test]
    fn test_count_without_condition() {
        let db = test_db();
        assert_eq!(Select::new().count(&db).unwrap(), 6);
    }

    #[test]
    fn test_count_with_condition() {
        let db = test_db();
        assert_eq!(Select::new().where_(eq("kind", "a")).count(&db).unwrap(), 4);
        assert_eq!(Select::new().where_(eq("kind", "b")).count(&db).unwrap(), 2);
        assert_eq!(Select::new().where_(eq("kind", "z")).count(&db).unwrap(), 0);
    }

    #[test]
    fn test_count_offset_clamps_to_zero() {
        let db = test_db();
        let query = Select::new().where_(eq("kind", "b")).offset(5);
        assert_eq!(query.count(&db).unwrap(), 0);
    }

    #[test]
    fn test_count_honors_limit() {
        let db = test_db();
        let query = Select::new().where_(eq("kind", "a")).limit(3);
        assert_eq!(query.count(&db).unwrap(), 3);

        let query = Select::new().where_(eq("kind", "a")).offset(3).limit(3);
        assert_eq!(query.count(&db).unwrap(), 1);
    }

    #[test]
    fn test_filtered_unlimited_shapes() {
        let db = test_db();
        let mask = Select::new().filtered_unlimited(&db).unwrap().unwrap();
        assert!(matches!(mask, BitSet::AllOnes(6)));

        let mask = Select::new()
            .where_(eq("kind", "a"))
            .filtered_unlimited(&db)
            .unwrap()
            .unwrap();
        assert!(matches!(mask, BitSet::Dense(_)));
        assert_eq!(mask.cardinality(), 4);

        assert!(Select::new()
            .where_(eq("kind", "z"))
            .filtered_unlimited(&db)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_count_is_idempotent() {
        let db = test_db();
        let query = Select::new().where_(eq("kind", "a"));
        let first = query.count(&db).unwrap();
        for _ in 0..5 {
            assert_eq!(query.count(&db).unwrap(), first);
        }
    }
}
