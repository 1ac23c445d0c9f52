//! Boolean condition tree
//!
//! Conditions compile to bit-set operations with OR-into semantics: `apply`
//! sets the bits of satisfying documents in the caller's target and leaves
//! every other bit untouched. The returned flag says whether any bit of the
//! target is set afterwards; `false` short-circuits enclosing ANDs.
//!
//! A condition naming an absent filterable index is unsatisfiable, not an
//! error: the database simply has no such field.

use crate::bitset::{BitSetPool, DenseBitSet};
use crate::db::DB;
use crate::error::{CoralError, Result};

/// A boolean predicate over indexed fields
#[derive(Clone, Debug)]
pub enum Condition {
    /// Field equals the value
    Eq { field: String, value: Vec<u8> },
    /// Field is greater than or equal to the value
    Gte { field: String, value: Vec<u8> },
    /// Field is less than or equal to the value
    Lte { field: String, value: Vec<u8> },
    /// Field equals one of the values
    In { field: String, values: Vec<Vec<u8>> },
    /// Every child holds
    And(Vec<Condition>),
    /// At least one child holds
    Or(Vec<Condition>),
}

/// Field equals `value`
pub fn eq(field: impl Into<String>, value: impl Into<Vec<u8>>) -> Condition {
    Condition::Eq {
        field: field.into(),
        value: value.into(),
    }
}

/// Field is greater than or equal to `value` (unsigned-lexicographic)
pub fn gte(field: impl Into<String>, value: impl Into<Vec<u8>>) -> Condition {
    Condition::Gte {
        field: field.into(),
        value: value.into(),
    }
}

/// Field is less than or equal to `value` (unsigned-lexicographic)
pub fn lte(field: impl Into<String>, value: impl Into<Vec<u8>>) -> Condition {
    Condition::Lte {
        field: field.into(),
        value: value.into(),
    }
}

/// Field equals one of `values`
pub fn in_set<V: Into<Vec<u8>>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
) -> Condition {
    Condition::In {
        field: field.into(),
        values: values.into_iter().map(Into::into).collect(),
    }
}

/// Every condition holds
pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::And(conditions.into_iter().collect())
}

/// At least one condition holds
pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Or(conditions.into_iter().collect())
}

impl Condition {
    /// OR the satisfying documents into `target`
    pub(crate) fn apply(&self, db: &DB, target: &mut DenseBitSet) -> Result<bool> {
        match self {
            Condition::Eq { field, value } => match db.filter(field) {
                None => Ok(false),
                Some(index) => index.eq(value, target),
            },
            Condition::Gte { field, value } => match db.filter(field) {
                None => Ok(false),
                Some(index) => index.range(Some(value), None, target),
            },
            Condition::Lte { field, value } => match db.filter(field) {
                None => Ok(false),
                Some(index) => index.range(None, Some(value), target),
            },
            Condition::In { field, values } => match db.filter(field) {
                None => Ok(false),
                Some(index) => {
                    let mut any = false;
                    for value in values {
                        any = index.eq(value, target)? || any;
                    }
                    Ok(any)
                }
            },
            Condition::And(children) => apply_and(children, db, target),
            Condition::Or(children) => apply_or(children, db, target),
        }
    }
}

// Intersection over scratch bit sets. Children evaluate into their own
// scratch space so the caller's accumulated bits never dilute the AND; the
// intersection is OR-ed into the target only once it is known non-empty.
// Scratch sets return to the pool on every exit path via their drop guards.
fn apply_and(children: &[Condition], db: &DB, target: &mut DenseBitSet) -> Result<bool> {
    match children.len() {
        0 => Err(CoralError::user("empty and-condition")),
        1 => children[0].apply(db, target),
        _ => {
            let mut res = BitSetPool::acquire(db.pool(), target.len());
            let mut scratch = BitSetPool::acquire(db.pool(), target.len());

            if !children[0].apply(db, &mut res)? {
                return Ok(false);
            }
            for child in &children[1..] {
                scratch.reset();
                if !child.apply(db, &mut scratch)? {
                    return Ok(false);
                }
                if !res.and_in_place(&scratch)? {
                    return Ok(false);
                }
            }
            target.or_in_place(&res)
        }
    }
}

// Plain union: every child is evaluated, no short-circuit.
fn apply_or(children: &[Condition], db: &DB, target: &mut DenseBitSet) -> Result<bool> {
    if children.is_empty() {
        return Err(CoralError::user("empty or-condition"));
    }
    let mut any = false;
    for child in children {
        any = child.apply(db, target)? || any;
    }
    Ok(any)
}
