//! Per-document payload store
//!
//! Documents are opaque byte blobs addressed by their dense id. A container
//! either stores the blobs in an indexed byte list or, when the build side
//! chose not to ship payloads, an "empty" descriptor that only fixes the
//! document count.

use bytes::Bytes;

use crate::error::{CoralError, Result};
use crate::format::tape::Tape;

use super::byte_list::ByteList;

/// Payload segment: raw document bytes, or just a document count
#[derive(Clone, Debug)]
pub enum Payload {
    Indexed(ByteList),
    Empty { count: usize },
}

impl Payload {
    pub(crate) fn parse_full(body: Bytes) -> Result<Self> {
        let mut tape = Tape::new(body);
        let chunk_len = tape.read_u64()? as usize;
        if chunk_len == 0 {
            return Err(CoralError::corrupted("empty payload chunk"));
        }
        let chunk = tape.take(chunk_len)?;
        Ok(Payload::Indexed(ByteList::parse(chunk)?))
    }

    pub(crate) fn parse_empty(body: Bytes) -> Result<Self> {
        let mut tape = Tape::new(body);
        let count = tape.read_u32()? as usize;
        Ok(Payload::Empty { count })
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        match self {
            Payload::Indexed(list) => list.len(),
            Payload::Empty { count } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of document `doc`
    ///
    /// An empty-payload container yields an empty slice for every in-range
    /// document id.
    pub fn get(&self, doc: usize) -> Result<&[u8]> {
        match self {
            Payload::Indexed(list) => list.get(doc),
            Payload::Empty { count } => {
                if doc >= *count {
                    return Err(CoralError::OutOfBounds {
                        index: doc,
                        size: *count,
                    });
                }
                Ok(&[])
            }
        }
    }
}
