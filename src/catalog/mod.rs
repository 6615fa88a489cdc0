//! Catalog - attribute types, values, schemas, tuples and table metadata.
//!
//! The index consumes this module as its value system: it asks an
//! [`AttType`] which comparison domain it promotes to and for its max
//! sentinel, and reads/writes the root location through [`Table`].

pub(crate) mod codec;
mod schema;
mod table;
mod value;

pub use schema::{Schema, Tuple};
pub use table::Table;
pub use value::{AttType, AttVal, MAX_STRING_SENTINEL};
