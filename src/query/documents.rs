//! Result cursor
//!
//! A pull iterator over matching documents: `next` advances, `scan` hands
//! the current document's raw payload to a processor, `close` releases the
//! mask (and also runs on drop). Offset is consumed inside `scan` — skipped
//! documents are still pulled from the scorer — and the limit budget is
//! enforced here as well, charging only documents actually delivered to a
//! processor.

use crate::db::DB;
use crate::error::{CoralError, Result};

use super::scorer::Scorer;

/// Cursor over the documents matched by a query
///
/// ```no_run
/// # fn demo(db: &coraldb::DB, query: &coraldb::Select) -> coraldb::Result<()> {
/// let mut docs = db.query(query)?;
/// while docs.next() {
///     docs.scan(|id, raw| {
///         println!("{id}: {} bytes", raw.len());
///         Ok(())
///     })?;
/// }
/// docs.close();
/// # Ok(())
/// # }
/// ```
pub struct Documents<'a> {
    db: &'a DB,
    scorer: Option<Scorer>,
    skip: usize,
    remaining: Option<usize>,
    current: Option<usize>,
    closed: bool,
    err: Option<CoralError>,
}

impl<'a> Documents<'a> {
    pub(crate) fn new(db: &'a DB, scorer: Scorer, skip: usize, limit: usize) -> Self {
        Self {
            db,
            scorer: Some(scorer),
            skip,
            remaining: (limit > 0).then_some(limit),
            current: None,
            closed: false,
            err: None,
        }
    }

    /// Advance to the next document; false at the end (the cursor closes
    /// itself)
    pub fn next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        if self.remaining == Some(0) {
            self.close();
            return false;
        }
        let doc = self.scorer.as_mut().and_then(Scorer::next);
        match doc {
            None => {
                self.close();
                false
            }
            Some(doc) => {
                self.current = Some(doc);
                true
            }
        }
    }

    /// Feed the current document to `processor`, or consume one skipped
    /// document without invoking it
    pub fn scan<F>(&mut self, processor: F) -> Result<()>
    where
        F: FnOnce(usize, &[u8]) -> Result<()>,
    {
        let result = self.scan_inner(processor);
        if let Err(err) = &result {
            self.err = Some(err.clone());
        }
        result
    }

    fn scan_inner<F>(&mut self, processor: F) -> Result<()>
    where
        F: FnOnce(usize, &[u8]) -> Result<()>,
    {
        if self.closed {
            return Err(CoralError::user("scan on a closed cursor"));
        }
        if self.remaining == Some(0) {
            return Err(CoralError::user("scan past the query limit"));
        }
        let doc = self
            .current
            .ok_or_else(|| CoralError::user("scan before next"))?;
        if self.skip > 0 {
            self.skip -= 1;
            return Ok(());
        }
        let raw = self.db.document(doc)?;
        processor(doc, raw)?;
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        Ok(())
    }

    /// Close the cursor and release its mask; idempotent
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.current = None;
        // Dropping the scorer releases the pooled mask, if any.
        self.scorer = None;
    }

    /// The error recorded by a failed `scan`, if any
    pub fn err(&self) -> Option<&CoralError> {
        self.err.as_ref()
    }
}

impl Drop for Documents<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
