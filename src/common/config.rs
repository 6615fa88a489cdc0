//! Configuration for bplusdb.
//!
//! Compile-time constants describe the on-disk page format. [`IndexConfig`]
//! carries the runtime knobs: how many bytes of each page the index may use
//! and how many frames the buffer pool holds.

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every page on disk and every frame in the buffer pool is exactly this
/// large. Pages are aligned to 4096 bytes for efficient Direct I/O.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
///
/// `u32::MAX` itself is reserved for [`PageId::INVALID`](crate::PageId::INVALID).
pub const MAX_PAGES: u64 = u32::MAX as u64;

/// Maximum theoretical database size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Smallest page capacity an index may be configured with.
pub const MIN_PAGE_CAPACITY: usize = 48;

/// Smallest buffer pool that can serve a split.
///
/// A split touches the page being split, the new sibling and the parent;
/// root growth touches one more.
pub const MIN_POOL_SIZE: usize = 4;

/// Default number of frames in the buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 64;

/// Runtime configuration for a B+ tree index.
///
/// `page_capacity` caps the bytes of each index page the tree will fill.
/// It defaults to the full [`PAGE_SIZE`]; tests shrink it to force splits
/// with only a handful of records.
///
/// # Example
/// ```
/// use bplusdb::IndexConfig;
///
/// let config = IndexConfig::default().with_page_capacity(256).with_pool_size(16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Usable bytes per index page, header included.
    pub page_capacity: usize,
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
}

impl IndexConfig {
    /// Set the page capacity.
    pub fn with_page_capacity(mut self, page_capacity: usize) -> Self {
        self.page_capacity = page_capacity;
        self
    }

    /// Set the buffer pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Check that every value is within its supported range.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_CAPACITY..=PAGE_SIZE).contains(&self.page_capacity) {
            return Err(Error::InvalidConfig(format!(
                "page_capacity {} outside {}..={}",
                self.page_capacity, MIN_PAGE_CAPACITY, PAGE_SIZE
            )));
        }
        if self.pool_size < MIN_POOL_SIZE {
            return Err(Error::InvalidConfig(format!(
                "pool_size {} below minimum {}",
                self.pool_size, MIN_POOL_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            page_capacity: PAGE_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}
