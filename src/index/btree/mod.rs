//! Disk-resident B+ tree.
//!
//! # Page layout
//! ```text
//!                 ┌──────────────────────────────┐
//!   Directory     │ k1->c1  k2->c2  ...  MAX->cn │   entries sorted, last
//!                 └──────────────────────────────┘   one is the sentinel
//!                      │       │            │
//!                 ┌────┘       │            └────┐
//!   Leaves     [t t t]      [t t t t]         [t t]   full tuples, sorted
//! ```
//!
//! Entry `k_i -> c_i` covers keys in `(k_{i-1}, k_i]`. Leaves are not
//! linked; range queries find their leaves by descending from the root.
//!
//! # Modules
//! - [`comparator`] - key comparison per ordering domain
//! - [`page_store`] - typed index pages on the buffer pool
//! - [`record`] - leaf and internal records
//! - `split`, `insert`, `discover` - the tree algorithms, as methods on
//!   [`BPlusTree`]
//! - [`iterator`] - range iterators
//! - `inspect` - height, dump, validation

pub mod comparator;
mod discover;
mod insert;
mod inspect;
pub mod iterator;
pub mod page_store;
pub mod record;
mod split;
mod tree;

pub use comparator::{KeyComparator, OrderingMode};
pub use iterator::{PageListIter, SortedRangeIter};
pub use page_store::{PageKind, PageStore};
pub use record::Record;
pub use tree::BPlusTree;
