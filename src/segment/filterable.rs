//! Filterable index segment
//!
//! A named field answering equality and range predicates: a sorted value
//! dictionary plus the value→documents multimap. Conditions resolve a value
//! (or a dictionary range) and OR the matching document sets into the query
//! mask.

use bytes::Bytes;

use crate::bitset::DenseBitSet;
use crate::error::Result;
use crate::format::tape::Tape;

use super::multimap::Multimap;
use super::sorted_set::SortedSet;
use super::{read_index_parts, validate_multimap};

/// Index over one filterable field
#[derive(Clone, Debug)]
pub struct FilterableIndex {
    name: String,
    values: SortedSet,
    docs: Multimap,
}

impl FilterableIndex {
    pub(crate) fn parse(body: Bytes, fixed: bool) -> Result<Self> {
        let mut tape = Tape::new(body);
        let (name, values, docs) = read_index_parts(&mut tape, fixed)?;
        Ok(Self { name, values, docs })
    }

    pub(crate) fn from_parts(name: String, values: SortedSet, docs: Multimap) -> Self {
        Self { name, values, docs }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's value dictionary
    pub fn values(&self) -> &SortedSet {
        &self.values
    }

    /// OR the documents equal to `value` into `target`; false when the value
    /// is not in the dictionary
    pub fn eq(&self, value: &[u8], target: &mut DenseBitSet) -> Result<bool> {
        match self.values.index_of(value)? {
            None => Ok(false),
            Some(key) => self.docs.or_into(key, target),
        }
    }

    /// OR the documents within the inclusive value bounds into `target`
    pub fn range(
        &self,
        min: Option<&[u8]>,
        max: Option<&[u8]>,
        target: &mut DenseBitSet,
    ) -> Result<bool> {
        let mut any = false;
        for key in self.values.range_of(min, max)? {
            any = self.docs.or_into(key, target)? || any;
        }
        Ok(any)
    }

    pub(crate) fn validate(&self, doc_count: usize) -> Result<()> {
        validate_multimap(&self.name, &self.values, &self.docs, doc_count)
    }
}
