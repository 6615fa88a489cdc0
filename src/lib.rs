//! bplusdb - A disk-resident B+ tree index over a paged buffer pool.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bplusdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree)                   │   │
//! │  │   BPlusTree: append, range discovery, range iterators    │   │
//! │  │   Splitter + recursive insert + root manager             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Catalog (catalog/)                       │   │
//! │  │   AttType / AttVal, Schema, Tuple, Table meta page       │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Buffer Pool (buffer/)                     │   │
//! │  │   BufferPoolManager + Frame + LRU replacer + Statistics  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │          DiskManager + Page + PageHeader (CRC32)         │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`storage`] - Disk I/O and page formats
//! - [`buffer`] - Buffer pool management and eviction
//! - [`catalog`] - Value system, schemas, tuples and table metadata
//! - [`index`] - The B+ tree
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use bplusdb::{AttType, AttVal, BPlusTree, BufferPoolManager, DiskManager,
//!     IndexConfig, Schema, Table, Tuple};
//!
//! let config = IndexConfig::default();
//! let dm = DiskManager::create("people.db").unwrap();
//! let pool = Arc::new(BufferPoolManager::new(config.pool_size, dm));
//!
//! let schema = Schema::new()
//!     .with_attribute("id", AttType::Int)
//!     .with_attribute("name", AttType::String);
//! let table = Table::create(Arc::clone(&pool), "people", schema).unwrap();
//! let mut tree = BPlusTree::new("name", table, pool, config).unwrap();
//!
//! tree.append(Tuple::new(vec![AttVal::Int(1), "ada".into()])).unwrap();
//! for tuple in tree.sorted_range_iter(&"a".into(), &"m".into()).unwrap() {
//!     println!("{:?}", tuple);
//! }
//! tree.flush().unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, IndexConfig, PageId, Result};

pub use buffer::{BufferPoolManager, BufferPoolStats, StatsSnapshot};
pub use catalog::{AttType, AttVal, Schema, Table, Tuple};
pub use index::btree::{BPlusTree, PageListIter, SortedRangeIter};
pub use storage::page::{Page, PageType};
pub use storage::DiskManager;
