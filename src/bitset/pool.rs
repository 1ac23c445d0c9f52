//! Pool of reusable bit-set buffers
//!
//! Query evaluation acquires one dense bit set per condition level; pooling
//! the backing word vectors keeps the hot path allocation-free. The pool is
//! owned by the `DB` rather than being process-global, so independent
//! databases never share free lists and tests stay deterministic.

use std::collections::HashMap;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

use super::dense::DenseBitSet;

/// Free lists of word vectors, keyed by word count
#[derive(Debug)]
pub struct BitSetPool {
    shelves: Mutex<HashMap<usize, Vec<Vec<u64>>>>,
}

impl BitSetPool {
    pub fn new() -> Self {
        Self {
            shelves: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a cleared bit set of `len` bits, reusing a pooled buffer when
    /// one of the right word count is available
    pub fn acquire(pool: &Arc<Self>, len: usize) -> PooledBitSet {
        let word_count = DenseBitSet::words_for(len);
        let recycled = pool
            .shelves
            .lock()
            .get_mut(&word_count)
            .and_then(Vec::pop);
        let words = match recycled {
            Some(mut words) => {
                // The previous tenant's bits must never leak through.
                words.iter_mut().for_each(|w| *w = 0);
                words
            }
            None => vec![0u64; word_count],
        };
        PooledBitSet {
            bits: DenseBitSet::from_words(len, words),
            pool: Arc::clone(pool),
        }
    }

    fn release(&self, bits: DenseBitSet) {
        let words = bits.into_words();
        if words.is_empty() {
            return;
        }
        self.shelves
            .lock()
            .entry(words.len())
            .or_default()
            .push(words);
    }

    #[cfg(test)]
    fn pooled_count(&self, word_count: usize) -> usize {
        self.shelves
            .lock()
            .get(&word_count)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for BitSetPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusively-owned bit set leased from a [`BitSetPool`]
///
/// Dereferences to [`DenseBitSet`]; the buffer returns to the pool on drop,
/// which is what guarantees release on every exit path of query evaluation,
/// including errors and short-circuits.
pub struct PooledBitSet {
    bits: DenseBitSet,
    pool: Arc<BitSetPool>,
}

impl Deref for PooledBitSet {
    type Target = DenseBitSet;

    fn deref(&self) -> &DenseBitSet {
        &self.bits
    }
}

impl DerefMut for PooledBitSet {
    fn deref_mut(&mut self) -> &mut DenseBitSet {
        &mut self.bits
    }
}

impl Drop for PooledBitSet {
    fn drop(&mut self) {
        self.pool.release(mem::take(&mut self.bits));
    }
}

impl std::fmt::Debug for PooledBitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.bits, f)
    }
}
