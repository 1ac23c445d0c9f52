//! Value→documents multimaps
//!
//! The inverse posting side of an index: for dictionary position `k`, the
//! set of document ids carrying that value. The dense form keeps one
//! fixed-width bit set per key (`words_per_key` big-endian u64 words); the
//! list form keeps one sorted document-id list per key. Both expose a single
//! operation, `or_into`, which unions key `k`'s documents into a caller
//! bit set.

use bytes::Bytes;

use crate::bitset::DenseBitSet;
use crate::error::{CoralError, Result};
use crate::format::tape::{be_u32_at, be_u64_at, Tape};

/// Dense multimap: one `words_per_key`-word bit set per dictionary entry
#[derive(Clone, Debug)]
pub struct BitSetMultimap {
    keys_count: usize,
    words_per_key: usize,
    words: Bytes,
}

impl BitSetMultimap {
    pub(crate) fn parse(tape: &mut Tape) -> Result<Self> {
        let keys_count = tape.read_u32()? as usize;
        let words_per_key = tape.read_u32()? as usize;
        let total = keys_count
            .checked_mul(words_per_key)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| CoralError::corrupted("multimap size overflows"))?;
        let words = tape.take(total)?;
        Ok(Self {
            keys_count,
            words_per_key,
            words,
        })
    }

    pub fn keys_count(&self) -> usize {
        self.keys_count
    }

    pub fn words_per_key(&self) -> usize {
        self.words_per_key
    }

    fn or_into(&self, key: usize, target: &mut DenseBitSet) -> Result<bool> {
        if key >= self.keys_count {
            return Err(CoralError::OutOfBounds {
                index: key,
                size: self.keys_count,
            });
        }
        if target.word_count() != self.words_per_key {
            return Err(CoralError::SizeMismatch {
                expected: self.words_per_key,
                actual: target.word_count(),
            });
        }
        let base = key * self.words_per_key * 8;
        let words = target.words_mut();
        let mut any = false;
        for (j, word) in words.iter_mut().enumerate() {
            *word |= be_u64_at(&self.words, base + j * 8);
            any |= *word != 0;
        }
        Ok(any)
    }
}

/// Sparse multimap: one sorted document-id list per dictionary entry
#[derive(Clone, Debug)]
pub struct ListMultimap {
    keys_count: usize,
    offsets: Bytes,
    elems: Bytes,
}

impl ListMultimap {
    pub(crate) fn parse(tape: &mut Tape) -> Result<Self> {
        let keys_count = tape.read_u32()? as usize;
        let offsets_len = keys_count
            .checked_add(1)
            .and_then(|n| n.checked_mul(8))
            .ok_or_else(|| CoralError::corrupted("multimap size overflows"))?;
        let offsets = tape.take(offsets_len)?;
        let elems = tape.rest();
        Ok(Self {
            keys_count,
            offsets,
            elems,
        })
    }

    pub fn keys_count(&self) -> usize {
        self.keys_count
    }

    fn or_into(&self, key: usize, target: &mut DenseBitSet) -> Result<bool> {
        if key >= self.keys_count {
            return Err(CoralError::OutOfBounds {
                index: key,
                size: self.keys_count,
            });
        }
        // Offsets count u32 elements, not bytes.
        let start = be_u64_at(&self.offsets, key * 8) as usize;
        let end = be_u64_at(&self.offsets, (key + 1) * 8) as usize;
        if start > end || end.saturating_mul(4) > self.elems.len() {
            return Err(CoralError::corrupted(format!(
                "multimap list [{start}, {end}) out of range"
            )));
        }
        for i in start..end {
            let doc = be_u32_at(&self.elems, i * 4) as usize;
            if doc >= target.len() {
                return Err(CoralError::OutOfBounds {
                    index: doc,
                    size: target.len(),
                });
            }
            target.set(doc);
        }
        Ok(target.any())
    }
}

/// A field's value→documents multimap, dense or sparse on the wire
#[derive(Clone, Debug)]
pub enum Multimap {
    BitSet(BitSetMultimap),
    List(ListMultimap),
}

impl Multimap {
    /// Number of keys (equals the dictionary size in a well-formed segment)
    pub fn keys_count(&self) -> usize {
        match self {
            Multimap::BitSet(map) => map.keys_count(),
            Multimap::List(map) => map.keys_count(),
        }
    }

    /// Union key `key`'s documents into `target`; returns whether any bit of
    /// `target` is now set
    pub fn or_into(&self, key: usize, target: &mut DenseBitSet) -> Result<bool> {
        match self {
            Multimap::BitSet(map) => map.or_into(key, target),
            Multimap::List(map) => map.or_into(key, target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense(keys: &[&[usize]], doc_count: usize) -> Multimap {
        let words_per_key = DenseBitSet::words_for(doc_count);
        let mut data = Vec::new();
        data.extend_from_slice(&(keys.len() as u32).to_be_bytes());
        data.extend_from_slice(&(words_per_key as u32).to_be_bytes());
        for docs in keys {
            let mut words = vec![0u64; words_per_key];
            for &doc in *docs {
                words[doc / 64] |= 1 << (doc % 64);
            }
            for word in words {
                data.extend_from_slice(&word.to_be_bytes());
            }
        }
        let mut tape = Tape::new(Bytes::from(data));
        Multimap::BitSet(BitSetMultimap::parse(&mut tape).unwrap())
    }

    fn list(keys: &[&[usize]]) -> Multimap {
        let mut data = Vec::new();
        data.extend_from_slice(&(keys.len() as u32).to_be_bytes());
        let mut offset = 0u64;
        data.extend_from_slice(&offset.to_be_bytes());
        for docs in keys {
            offset += docs.len() as u64;
            data.extend_from_slice(&offset.to_be_bytes());
        }
        for docs in keys {
            for &doc in *docs {
                data.extend_from_slice(&(doc as u32).to_be_bytes());
            }
        }
        let mut tape = Tape::new(Bytes::from(data));
        Multimap::List(ListMultimap::parse(&mut tape).unwrap())
    }

    fn collect(bits: &DenseBitSet) -> Vec<usize> {
        let mut out = Vec::new();
        let mut from = 0;
        while let Some(i) = bits.next_set(from) {
            out.push(i);
            from = i + 1;
        }
        out
    }

    #[test]
    fn test_dense_or_into() {
        let map = dense(&[&[0, 2], &[1, 4]], 5);
        let mut target = DenseBitSet::new(5);

        assert!(map.or_into(0, &mut target).unwrap());
        assert_eq!(collect(&target), vec![0, 2]);

        // OR-into accumulates; earlier bits stay.
        assert!(map.or_into(1, &mut target).unwrap());
        assert_eq!(collect(&target), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_dense_across_word_boundary() {
        let map = dense(&[&[0, 64, 129]], 130);
        let mut target = DenseBitSet::new(130);
        assert!(map.or_into(0, &mut target).unwrap());
        assert_eq!(collect(&target), vec![0, 64, 129]);
    }

    #[test]
    fn test_dense_key_out_of_bounds() {
        let map = dense(&[&[0]], 5);
        let mut target = DenseBitSet::new(5);
        assert!(matches!(
            map.or_into(1, &mut target),
            Err(CoralError::OutOfBounds { index: 1, size: 1 })
        ));
    }

    #[test]
    fn test_dense_word_count_mismatch() {
        let map = dense(&[&[0]], 5);
        let mut target = DenseBitSet::new(70);
        assert!(matches!(
            map.or_into(0, &mut target),
            Err(CoralError::SizeMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_list_or_into() {
        let map = list(&[&[0, 2], &[1, 4], &[]]);
        let mut target = DenseBitSet::new(5);

        assert!(map.or_into(1, &mut target).unwrap());
        assert_eq!(collect(&target), vec![1, 4]);

        // An empty list reports whatever is already set.
        assert!(map.or_into(2, &mut target).unwrap());
        let mut fresh = DenseBitSet::new(5);
        assert!(!map.or_into(2, &mut fresh).unwrap());
    }

    #[test]
    fn test_list_doc_out_of_bounds() {
        let map = list(&[&[7]]);
        let mut target = DenseBitSet::new(5);
        assert!(matches!(
            map.or_into(0, &mut target),
            Err(CoralError::OutOfBounds { index: 7, size: 5 })
        ));
    }

    #[test]
    fn test_dense_truncated_body() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.extend_from_slice(&[0u8; 8]); // only one of two keys present
        let mut tape = Tape::new(Bytes::from(data));
        assert!(matches!(
            BitSetMultimap::parse(&mut tape),
            Err(CoralError::ShortData)
        ));
    }
}
