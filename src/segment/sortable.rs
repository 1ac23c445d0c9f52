//! Sortable index segment
//!
//! Everything a filterable index has, plus the document→value forward map.
//! The forward map turns "order by field" into integer sort keys: dictionary
//! positions compare exactly like the values they stand for.

use bytes::Bytes;

use crate::bitset::DenseBitSet;
use crate::error::{CoralError, Result};
use crate::format::tape::Tape;

use super::doc_values::DocToValueMap;
use super::filterable::FilterableIndex;
use super::multimap::Multimap;
use super::sorted_set::SortedSet;
use super::{read_index_parts, validate_multimap};

/// Index over one sortable field
#[derive(Clone, Debug)]
pub struct SortableIndex {
    name: String,
    values: SortedSet,
    docs: Multimap,
    doc_values: DocToValueMap,
}

impl SortableIndex {
    pub(crate) fn parse(body: Bytes, fixed: bool) -> Result<Self> {
        let mut tape = Tape::new(body);
        let (name, values, docs) = read_index_parts(&mut tape, fixed)?;
        let doc_values = DocToValueMap::parse(&mut tape)?;
        Ok(Self {
            name,
            values,
            docs,
            doc_values,
        })
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's value dictionary
    pub fn values(&self) -> &SortedSet {
        &self.values
    }

    /// Dictionary position of document `doc`'s value
    pub fn value_of(&self, doc: usize) -> Result<usize> {
        self.doc_values.get(doc)
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

    /// A filterable view over the same dictionary and multimap (used by the
    /// full-index segment types, which serve both roles)
    pub(crate) fn to_filterable(&self) -> FilterableIndex {
        FilterableIndex::from_parts(self.name.clone(), self.values.clone(), self.docs.clone())
    }

    pub(crate) fn validate(&self, doc_count: usize) -> Result<()> {
        validate_multimap(&self.name, &self.values, &self.docs, doc_count)?;
        if self.doc_values.len() != doc_count {
            return Err(CoralError::corrupted(format!(
                "sortable index {:?}: document map covers {} of {} documents",
                self.name,
                self.doc_values.len(),
                doc_count
            )));
        }
        Ok(())
    }
}
