//! Ordered iteration over a query mask
//!
//! A scorer turns the mask into a stream of document ids. The id scorer
//! walks set bits in ascending id order; the sorting scorer materializes the
//! mask once, keys every document by its dictionary positions under the
//! named sortable indexes, and emits in composite-key order.

use crate::bitset::BitSet;
use crate::db::DB;
use crate::error::{CoralError, Result};

use super::select::{Direction, Order};

/// Emits mask bits in ascending document-id order
pub(crate) struct IdScorer {
    mask: BitSet,
    from: usize,
}

impl IdScorer {
    pub(crate) fn new(mask: BitSet) -> Self {
        Self { mask, from: 0 }
    }

    fn next(&mut self) -> Option<usize> {
        let doc = self.mask.next_set(self.from)?;
        self.from = doc + 1;
        Some(doc)
    }
}

/// Emits mask bits ordered by sortable-index value tuples
///
/// The composite key of document `d` is the tuple of dictionary positions
/// `(S1.value_of(d), .., Sk.value_of(d))`; positions compare exactly like
/// the byte-string values they index. `Desc` reverses the key comparison;
/// ties always break by ascending document id, which keeps the emission
/// order total and deterministic.
pub(crate) struct SortingScorer {
    ordered: Vec<u32>,
    cursor: usize,
}

impl SortingScorer {
    pub(crate) fn build(db: &DB, mask: &BitSet, order: &Order) -> Result<Self> {
        let sorters = order
            .fields()
            .iter()
            .map(|name| {
                db.sorter(name).ok_or_else(|| {
                    CoralError::user(format!("unknown sortable field {name:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut keyed: Vec<(Vec<u32>, u32)> = Vec::new();
        let mut from = 0;
        while let Some(doc) = mask.next_set(from) {
            let mut key = Vec::with_capacity(sorters.len());
            for sorter in &sorters {
                key.push(sorter.value_of(doc)? as u32);
            }
            keyed.push((key, doc as u32));
            from = doc + 1;
        }

        let descending = order.direction() == Direction::Desc;
        keyed.sort_by(|a, b| {
            let by_key = a.0.cmp(&b.0);
            let by_key = if descending { by_key.reverse() } else { by_key };
            by_key.then(a.1.cmp(&b.1))
        });

        Ok(Self {
            ordered: keyed.into_iter().map(|(_, doc)| doc).collect(),
            cursor: 0,
        })
    }

    fn next(&mut self) -> Option<usize> {
        let doc = *self.ordered.get(self.cursor)?;
        self.cursor += 1;
        Some(doc as usize)
    }
}

/// The two emission orders a cursor can be driven by
pub(crate) enum Scorer {
    Id(IdScorer),
    Sorting(SortingScorer),
}

impl Scorer {
    pub(crate) fn next(&mut self) -> Option<usize> {
        match self {
            Scorer::Id(scorer) => scorer.next(),
            Scorer::Sorting(scorer) => scorer.next(),
        }
    }
}
