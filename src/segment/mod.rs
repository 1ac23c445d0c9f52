//! Typed segments of the container image
//!
//! Every segment borrows reference-counted slices of the single backing
//! image; nothing is copied out and nothing mutates after load.

mod byte_list;
mod doc_values;
mod filterable;
mod multimap;
mod payload;
mod sortable;
mod sorted_set;

pub use byte_list::ByteList;
pub use doc_values::DocToValueMap;
pub use filterable::FilterableIndex;
pub use multimap::{BitSetMultimap, ListMultimap, Multimap};
pub use payload::Payload;
pub use sortable::SortableIndex;
pub use sorted_set::{FixedSortedSet, SortedSet, VarSortedSet};

use crate::bitset::DenseBitSet;
use crate::error::{CoralError, Result};
use crate::format::tape::Tape;

/// Multimap wire subtype: per-key document-id lists
pub(crate) const MULTIMAP_LIST: u32 = 1000;
/// Multimap wire subtype: per-key fixed-width bit sets
pub(crate) const MULTIMAP_BITSET: u32 = 2000;

// The body shape shared by filterable, sortable, and full segments:
// length-prefixed name, then the values chunk, then the multimap chunk.
pub(crate) fn read_index_parts(tape: &mut Tape, fixed: bool) -> Result<(String, SortedSet, Multimap)> {
    let name_len = tape.read_u32()? as usize;
    let name_bytes = tape.take(name_len)?;
    let name = std::str::from_utf8(&name_bytes)
        .map_err(|_| CoralError::corrupted("index name is not valid UTF-8"))?
        .to_owned();

    let values_len = tape.read_u64()? as usize;
    if values_len == 0 {
        return Err(CoralError::corrupted(format!(
            "index {name:?}: empty values chunk"
        )));
    }
    let values_chunk = tape.take(values_len)?;
    let values = if fixed {
        SortedSet::Fixed(FixedSortedSet::parse(values_chunk)?)
    } else {
        SortedSet::Var(VarSortedSet::parse(values_chunk)?)
    };

    let docs_len = tape.read_u64()? as usize;
    if docs_len == 0 {
        return Err(CoralError::corrupted(format!(
            "index {name:?}: empty multimap chunk"
        )));
    }
    let mut docs_tape = Tape::new(tape.take(docs_len)?);
    let subtype = docs_tape.read_u32()?;
    let docs = match subtype {
        MULTIMAP_BITSET => Multimap::BitSet(BitSetMultimap::parse(&mut docs_tape)?),
        MULTIMAP_LIST => Multimap::List(ListMultimap::parse(&mut docs_tape)?),
        other => {
            return Err(CoralError::corrupted(format!(
                "index {name:?}: unknown multimap subtype {other}"
            )))
        }
    };

    Ok((name, values, docs))
}

// Shape checks shared by both index roles, run once the document count is
// known: the multimap must key every dictionary entry, and a dense multimap's
// stripe width must match the document universe.
pub(crate) fn validate_multimap(
    name: &str,
    values: &SortedSet,
    docs: &Multimap,
    doc_count: usize,
) -> Result<()> {
    if docs.keys_count() != values.len() {
        return Err(CoralError::corrupted(format!(
            "index {name:?}: multimap keys {} do not match dictionary size {}",
            docs.keys_count(),
            values.len()
        )));
    }
    if let Multimap::BitSet(map) = docs {
        let expected = DenseBitSet::words_for(doc_count);
        if map.words_per_key() != expected {
            return Err(CoralError::corrupted(format!(
                "index {name:?}: multimap stripe is {} words, {} documents need {}",
                map.words_per_key(),
                doc_count,
                expected
            )));
        }
    }
    Ok(())
}
