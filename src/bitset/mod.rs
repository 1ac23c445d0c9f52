//! Bit sets over the document-id universe
//!
//! A query mask is one of three shapes: a dense pooled bit vector, or one of
//! two read-only sentinels ("every document", "no document") that avoid
//! allocating when the answer is trivially universal or empty. Keeping the
//! shapes in one closed enum makes the word-level fast paths exhaustive
//! matches instead of downcasts.

mod dense;
mod pool;

pub use dense::DenseBitSet;
pub use pool::{BitSetPool, PooledBitSet};

use crate::error::{CoralError, Result};

/// A fixed-length bit set: dense and mutable, or a read-only sentinel
///
/// Sentinels accept the read surface (`test`, `cardinality`, `next_set`) and
/// ignore mutating no-ops (`set`, `reset`); in-place AND/OR on a sentinel
/// receiver fails with [`CoralError::ReadOnly`].
pub enum BitSet {
    Dense(PooledBitSet),
    /// All bits in `[0, n)` set
    AllOnes(usize),
    /// No bits set, length `n`
    AllZeros(usize),
}

impl BitSet {
    /// Length in bits
    pub fn len(&self) -> usize {
        match self {
            BitSet::Dense(bits) => bits.len(),
            BitSet::AllOnes(n) | BitSet::AllZeros(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test bit `i`; false when out of range
    pub fn test(&self, i: usize) -> bool {
        match self {
            BitSet::Dense(bits) => bits.test(i),
            BitSet::AllOnes(n) => i < *n,
            BitSet::AllZeros(_) => false,
        }
    }

    /// Set bit `i`; no-op on sentinels and out of range
    pub fn set(&mut self, i: usize) {
        if let BitSet::Dense(bits) = self {
            bits.set(i);
        }
    }

    /// Clear all bits; no-op on sentinels
    pub fn reset(&mut self) {
        if let BitSet::Dense(bits) = self {
            bits.reset();
        }
    }

    /// Number of set bits
    pub fn cardinality(&self) -> usize {
        match self {
            BitSet::Dense(bits) => bits.cardinality(),
            BitSet::AllOnes(n) => *n,
            BitSet::AllZeros(_) => 0,
        }
    }

    /// Smallest set bit index `j >= from`, if any
    pub fn next_set(&self, from: usize) -> Option<usize> {
        match self {
            BitSet::Dense(bits) => bits.next_set(from),
            BitSet::AllOnes(n) => (from < *n).then_some(from),
            BitSet::AllZeros(_) => None,
        }
    }

    /// Intersect with `other` in place; returns whether any bit remains set
    pub fn and_in_place(&mut self, other: &BitSet) -> Result<bool> {
        let bits = match self {
            BitSet::Dense(bits) => bits,
            BitSet::AllOnes(_) | BitSet::AllZeros(_) => return Err(CoralError::ReadOnly),
        };
        match other {
            BitSet::Dense(o) => bits.and_in_place(o),
            BitSet::AllOnes(n) => {
                check_len(bits.len(), *n)?;
                Ok(bits.any())
            }
            BitSet::AllZeros(n) => {
                check_len(bits.len(), *n)?;
                bits.reset();
                Ok(false)
            }
        }
    }

    /// Union with `other` in place; returns whether any bit is set
    pub fn or_in_place(&mut self, other: &BitSet) -> Result<bool> {
        let bits = match self {
            BitSet::Dense(bits) => bits,
            BitSet::AllOnes(_) | BitSet::AllZeros(_) => return Err(CoralError::ReadOnly),
        };
        match other {
            BitSet::Dense(o) => bits.or_in_place(o),
            BitSet::AllOnes(n) => {
                check_len(bits.len(), *n)?;
                let len = bits.len();
                for i in 0..len {
                    bits.set(i);
                }
                Ok(len > 0)
            }
            BitSet::AllZeros(n) => {
                check_len(bits.len(), *n)?;
                Ok(bits.any())
            }
        }
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CoralError::SizeMismatch { expected, actual });
    }
    Ok(())
}
