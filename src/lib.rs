//! coraldb — an embeddable, read-only document database
//!
//! A build-time [`DatabaseBuilder`] serializes documents and their indexed
//! fields into a single immutable file; at runtime [`read_db`] (or
//! [`read_verify_db`], which also checks the trailing MD5 digest) loads that
//! image and answers queries of the form "select documents WHERE condition
//! ORDER BY fields OFFSET/LIMIT".
//!
//! Queries are built programmatically from a small algebra and compile to
//! bit-set intersections and unions over the value→documents multimaps of
//! the named fields:
//!
//! ```
//! use coraldb::{and, asc, eq, gte, read_db, DatabaseBuilder, DocumentBuilder, Select};
//!
//! # fn main() -> coraldb::Result<()> {
//! let mut builder = DatabaseBuilder::new();
//! builder
//!     .document(
//!         DocumentBuilder::new()
//!             .filterable("color", "red")
//!             .full("price", "200")
//!             .payload("first"),
//!     )
//!     .document(
//!         DocumentBuilder::new()
//!             .filterable("color", "red")
//!             .full("price", "100")
//!             .payload("second"),
//!     );
//! let image = builder.build()?;
//!
//! let db = read_db(image.as_slice())?;
//! let query = Select::new()
//!     .where_(and([eq("color", "red"), gte("price", "150")]))
//!     .order_by(asc(["price"]));
//! assert_eq!(db.count(&query)?, 1);
//!
//! let mut docs = db.query(&query)?;
//! while docs.next() {
//!     docs.scan(|id, raw| {
//!         assert_eq!((id, raw), (0, b"first".as_slice()));
//!         Ok(())
//!     })?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A loaded [`DB`] is immutable and freely shareable across threads.

pub mod bitset;
pub mod db;
pub mod error;
pub mod format;
pub mod query;
pub mod segment;

pub use bitset::{BitSet, BitSetPool, DenseBitSet, PooledBitSet};
pub use db::DB;
pub use error::{CoralError, Result};
pub use format::{read_db, read_verify_db, DatabaseBuilder, DocumentBuilder};
pub use query::{
    and, asc, desc, eq, gte, in_set, lte, or, Condition, Direction, Documents, Order, Select,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
