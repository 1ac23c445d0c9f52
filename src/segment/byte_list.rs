//! Indexed list of variable-length byte strings
//!
//! Wire shape shared by the variable-length dictionary and the payload
//! store: u32 element count, `count + 1` big-endian u64 offsets, then the
//! concatenated byte pool. Element `i` is `pool[offsets[i]..offsets[i+1]]`.

use bytes::Bytes;

use crate::error::{CoralError, Result};
use crate::format::tape::{be_u64_at, Tape};

/// Zero-copy view over a serialized byte-string list
#[derive(Clone, Debug)]
pub struct ByteList {
    size: usize,
    offsets: Bytes,
    elems: Bytes,
}

impl ByteList {
    pub(crate) fn parse(chunk: Bytes) -> Result<Self> {
        let mut tape = Tape::new(chunk);
        let size = tape.read_u32()? as usize;
        let offsets_len = size
            .checked_add(1)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| CoralError::corrupted("byte list size overflows"))?;
        let offsets = tape.take(offsets_len)?;
        let elems = tape.rest();
        Ok(Self {
            size,
            offsets,
            elems,
        })
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Element `i` as a raw byte slice
    pub fn get(&self, i: usize) -> Result<&[u8]> {
        if i >= self.size {
            return Err(CoralError::OutOfBounds {
                index: i,
                size: self.size,
            });
        }
        let start = be_u64_at(&self.offsets, i * 8) as usize;
        let end = be_u64_at(&self.offsets, (i + 1) * 8) as usize;
        if start > end || end > self.elems.len() {
            return Err(CoralError::corrupted(format!(
                "byte list offsets [{start}, {end}) out of range for pool of {}",
                self.elems.len()
            )));
        }
        Ok(&self.elems[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(elems: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(elems.len() as u32).to_be_bytes());
        let mut offset = 0u64;
        out.extend_from_slice(&offset.to_be_bytes());
        for elem in elems {
            offset += elem.len() as u64;
            out.extend_from_slice(&offset.to_be_bytes());
        }
        for elem in elems {
            out.extend_from_slice(elem);
        }
        out
    }

    #[test]
    fn test_get() {
        let data = encode(&[b"red", b"", b"green-blue"]);
        let list = ByteList::parse(Bytes::from(data)).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0).unwrap(), b"red");
        assert_eq!(list.get(1).unwrap(), b"");
        assert_eq!(list.get(2).unwrap(), b"green-blue");
    }

    #[test]
    fn test_out_of_bounds() {
        let list = ByteList::parse(Bytes::from(encode(&[b"x"]))).unwrap();
        assert!(matches!(
            list.get(1),
            Err(CoralError::OutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn test_truncated_offsets() {
        let mut data = encode(&[b"abc"]);
        data.truncate(10);
        assert!(matches!(
            ByteList::parse(Bytes::from(data)),
            Err(CoralError::ShortData)
        ));
    }

    #[test]
    fn test_corrupt_offsets() {
        let mut data = encode(&[b"abc"]);
        // Point the end offset far past the pool.
        data[4 + 8 + 7] = 0xFF;
        let list = ByteList::parse(Bytes::from(data)).unwrap();
        assert!(matches!(list.get(0), Err(CoralError::CorruptedData(_))));
    }

    #[test]
    fn test_empty_list() {
        let list = ByteList::parse(Bytes::from(encode(&[]))).unwrap();
        assert!(list.is_empty());
        assert!(list.get(0).is_err());
    }
}
