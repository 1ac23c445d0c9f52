//! The loaded database
//!
//! A `DB` aggregates the typed segments of one container image: filterable
//! and sortable indexes by field name plus the payload store. It is
//! immutable after construction and freely shareable across threads; the
//! only mutable state behind it is the bit-set pool, which is internally
//! synchronized.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::bitset::{BitSet, BitSetPool};
use crate::error::Result;
use crate::format::reader;
use crate::query::{Documents, IdScorer, Scorer, Select, SortingScorer};
use crate::segment::{FilterableIndex, Payload, SortableIndex};

/// An immutable document database loaded from a container image
#[derive(Debug)]
pub struct DB {
    filters: HashMap<String, FilterableIndex>,
    sorters: HashMap<String, SortableIndex>,
    payload: Payload,
    pool: Arc<BitSetPool>,
}

impl DB {
    /// Decode a database from an image without verifying its digest
    pub fn from_bytes(image: Bytes) -> Result<DB> {
        reader::decode(image, false)
    }

    /// Decode a database from an image, verifying the trailing MD5 digest
    pub fn from_bytes_verify(image: Bytes) -> Result<DB> {
        reader::decode(image, true)
    }

    pub(crate) fn assemble(
        filters: HashMap<String, FilterableIndex>,
        sorters: HashMap<String, SortableIndex>,
        payload: Payload,
    ) -> DB {
        DB {
            filters,
            sorters,
            payload,
            pool: Arc::new(BitSetPool::new()),
        }
    }

    /// The filterable index of `name`, if the database has one
    pub fn filter(&self, name: &str) -> Option<&FilterableIndex> {
        self.filters.get(name)
    }

    /// The sortable index of `name`, if the database has one
    pub fn sorter(&self, name: &str) -> Option<&SortableIndex> {
        self.sorters.get(name)
    }

    /// Raw payload bytes of document `doc`
    pub fn document(&self, doc: usize) -> Result<&[u8]> {
        self.payload.get(doc)
    }

    /// Number of documents in the database
    pub fn documents_count(&self) -> usize {
        self.payload.len()
    }

    /// Execute a query into a [`Documents`] cursor
    ///
    /// An unsatisfiable condition yields an empty cursor, not an error.
    pub fn query(&self, query: &Select) -> Result<Documents<'_>> {
        let doc_count = self.documents_count();
        let mask = query
            .filtered_unlimited(self)?
            .unwrap_or(BitSet::AllZeros(doc_count));
        debug!(
            matched = mask.cardinality(),
            ordered = query.order().is_some(),
            "query mask computed"
        );
        let scorer = match query.order() {
            Some(order) => {
                let scorer = SortingScorer::build(self, &mask, order)?;
                // The sorted positions are materialized; the mask can go
                // back to the pool right away.
                drop(mask);
                Scorer::Sorting(scorer)
            }
            None => Scorer::Id(IdScorer::new(mask)),
        };
        Ok(Documents::new(
            self,
            scorer,
            query.skip(),
            query.limit_value(),
        ))
    }

    /// Number of documents matching a query, honoring offset and limit
    ///
    /// Faster than iterating: the mask's cardinality is popcounted without
    /// driving a cursor.
    pub fn count(&self, query: &Select) -> Result<usize> {
        query.count(self)
    }

    pub(crate) fn pool(&self) -> &Arc<BitSetPool> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{read_db, DatabaseBuilder, DocumentBuilder};
    use crate::query::eq;

    fn test_db() -> DB {
        let mut builder = DatabaseBuilder::new();
        for (color, score) in [("red", "9"), ("blue", "3"), ("red", "5")] {
            builder.document(
                DocumentBuilder::new()
                    .filterable("color", color)
                    .sortable("score", score)
                    .payload(format!("{color}:{score}")),
            );
        }
        read_db(builder.build().unwrap().as_slice()).unwrap()
    }

    #[test]
    fn test_surface() {
        let db = test_db();
        assert_eq!(db.documents_count(), 3);
        assert!(db.filter("color").is_some());
        assert!(db.filter("score").is_none());
        assert!(db.sorter("score").is_some());
        assert!(db.sorter("color").is_none());
        assert_eq!(db.document(1).unwrap(), b"blue:3");
        assert!(db.document(3).is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let db = Arc::new(test_db());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = Arc::clone(&db);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let query = Select::new().where_(eq("color", "red"));
                        assert_eq!(db.count(&query).unwrap(), 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
