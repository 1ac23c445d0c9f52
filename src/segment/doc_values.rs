//! Document→value forward map
//!
//! Sortable indexes carry the inverse of the multimap as well: for each
//! document id, the dictionary position of its value. This is what gives a
//! sorting scorer O(1) sort keys per document.

use bytes::Bytes;

use crate::error::{CoralError, Result};
use crate::format::tape::{be_u32_at, Tape};

/// Dense array of dictionary positions, one u32 per document id
#[derive(Clone, Debug)]
pub struct DocToValueMap {
    size: usize,
    values: Bytes,
}

impl DocToValueMap {
    pub(crate) fn parse(tape: &mut Tape) -> Result<Self> {
        let size = tape.read_u32()? as usize;
        let total = size
            .checked_mul(4)
            .ok_or_else(|| CoralError::corrupted("document map size overflows"))?;
        let values = tape.take(total)?;
        Ok(Self { size, values })
    }

    /// Number of documents covered (equals the database document count)
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Dictionary position of document `doc`'s value
    pub fn get(&self, doc: usize) -> Result<usize> {
        if doc >= self.size {
            return Err(CoralError::OutOfBounds {
                index: doc,
                size: self.size,
            });
        }
        Ok(be_u32_at(&self.values, doc * 4) as usize)
    }
}
