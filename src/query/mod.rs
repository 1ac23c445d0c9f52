//! Query algebra and execution
//!
//! Queries are built programmatically: a [`Condition`] tree combined with
//! [`Select`]'s order/offset/limit window, executed by the database into a
//! [`Documents`] cursor. There is no query-string parser.

mod condition;
mod documents;
mod scorer;
mod select;

pub use condition::{and, eq, gte, in_set, lte, or, Condition};
pub use documents::Documents;
pub use select::{asc, desc, Direction, Order, Select};

pub(crate) use scorer::{IdScorer, Scorer, SortingScorer};
