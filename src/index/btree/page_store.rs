//! Index pages on top of the buffer pool.
//!
//! Every method is one fetch-mutate-release cycle: a page guard never
//! outlives the call, so the tree can recurse freely without holding pins.

use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::catalog::Schema;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{PageHeader, PageType, RECORD_OVERHEAD};

use super::comparator::KeyComparator;
use super::record::Record;

/// What an index page holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Full tuples.
    Leaf,
    /// `{key, child}` separators.
    Directory,
}

impl PageKind {
    pub fn page_type(self) -> PageType {
        match self {
            PageKind::Leaf => PageType::BTreeLeaf,
            PageKind::Directory => PageType::BTreeInternal,
        }
    }

    pub fn from_page_type(page_type: PageType) -> Option<Self> {
        match page_type {
            PageType::BTreeLeaf => Some(PageKind::Leaf),
            PageType::BTreeInternal => Some(PageKind::Directory),
            _ => None,
        }
    }
}

/// Typed access to index pages with a fixed byte capacity.
#[derive(Clone)]
pub struct PageStore {
    pool: Arc<BufferPoolManager>,
    schema: Arc<Schema>,
    capacity: usize,
}

impl PageStore {
    pub fn new(pool: Arc<BufferPoolManager>, schema: Arc<Schema>, capacity: usize) -> Self {
        Self {
            pool,
            schema,
            capacity,
        }
    }

    pub fn pool(&self) -> &Arc<BufferPoolManager> {
        &self.pool
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Largest on-page size (length prefix included) of a leaf record.
    ///
    /// Four such records fit in the usable area, which keeps both halves of
    /// any split within capacity even when directory entries are slightly
    /// larger than the leaf records they were derived from.
    pub fn max_record_size(&self) -> usize {
        (self.capacity - PageHeader::SIZE) / 4
    }

    /// On-page size of `record`, length prefix included.
    pub fn slot_size(record: &Record) -> usize {
        RECORD_OVERHEAD + record.encoded_len()
    }

    /// Whether `records` fit together on one page.
    pub fn fits(&self, records: &[Record]) -> bool {
        let bytes: usize = records.iter().map(Self::slot_size).sum();
        PageHeader::SIZE + bytes <= self.capacity
    }

    /// Allocate a fresh, empty page of `kind`.
    pub fn allocate(&self, kind: PageKind) -> Result<PageId> {
        let mut guard = self.pool.new_page()?;
        guard.init(kind.page_type());
        Ok(guard.page_id())
    }

    /// Kind of the page, or `UnexpectedPageType` for a non-index page.
    pub fn kind(&self, page_id: PageId) -> Result<PageKind> {
        let page_type = self.pool.fetch_page_read(page_id)?.page_type();
        PageKind::from_page_type(page_type).ok_or_else(|| Error::UnexpectedPageType {
            page_id: page_id.0,
            found: format!("{:?}", page_type),
        })
    }

    /// Retag a page. Existing records are kept as bytes.
    pub fn set_kind(&self, page_id: PageId, kind: PageKind) -> Result<()> {
        self.pool
            .fetch_page_write(page_id)?
            .set_page_type(kind.page_type());
        Ok(())
    }

    /// Append `record` if it fits; `Ok(false)` leaves the page unchanged.
    pub fn append(&self, page_id: PageId, record: &Record) -> Result<bool> {
        let bytes = record.encode();
        let mut guard = self.pool.fetch_page_write(page_id)?;
        Ok(guard.append_record(&bytes, self.capacity))
    }

    /// Insert `record` so it becomes the page's `index`-th record.
    ///
    /// `Ok(false)` leaves the page unchanged when it does not fit.
    pub fn insert(&self, page_id: PageId, index: usize, record: &Record) -> Result<bool> {
        let bytes = record.encode();
        let mut guard = self.pool.fetch_page_write(page_id)?;
        if guard.used_bytes() + RECORD_OVERHEAD + bytes.len() > self.capacity {
            return Ok(false);
        }

        let mut existing = guard
            .records()
            .map(|r| r.map(<[u8]>::to_vec))
            .collect::<Result<Vec<_>>>()?;
        existing.insert(index.min(existing.len()), bytes);

        guard.clear_records();
        for bytes in &existing {
            if !guard.append_record(bytes, self.capacity) {
                return Err(Error::TreeCorrupted {
                    page_id: page_id.0,
                    operation: "insert",
                    reason: "records no longer fit after insertion".to_string(),
                });
            }
        }
        Ok(true)
    }

    /// Remove every record, keeping the kind.
    pub fn clear(&self, page_id: PageId) -> Result<()> {
        self.pool.fetch_page_write(page_id)?.clear_records();
        Ok(())
    }

    /// Owned copies of the page's records, in storage order.
    pub fn records(&self, page_id: PageId) -> Result<Vec<Record>> {
        let guard = self.pool.fetch_page_read(page_id)?;
        let kind = PageKind::from_page_type(guard.page_type()).ok_or_else(|| {
            Error::UnexpectedPageType {
                page_id: page_id.0,
                found: format!("{:?}", guard.page_type()),
            }
        })?;

        guard
            .records()
            .map(|bytes| bytes.and_then(|b| Record::decode(kind, b, &self.schema)))
            .collect()
    }

    /// Number of records on the page.
    pub fn record_count(&self, page_id: PageId) -> Result<usize> {
        Ok(self.pool.fetch_page_read(page_id)?.record_count())
    }

    /// Reorder the page's records by key. Equal keys keep their order.
    pub fn sort_in_place(&self, page_id: PageId, comparator: &KeyComparator) -> Result<()> {
        let mut guard = self.pool.fetch_page_write(page_id)?;
        let kind = PageKind::from_page_type(guard.page_type()).ok_or_else(|| {
            Error::UnexpectedPageType {
                page_id: page_id.0,
                found: format!("{:?}", guard.page_type()),
            }
        })?;

        let mut records = guard
            .records()
            .map(|bytes| bytes.and_then(|b| Record::decode(kind, b, &self.schema)))
            .collect::<Result<Vec<_>>>()?;
        if records.windows(2).all(|w| comparator.compare(&w[0], &w[1]).is_le()) {
            return Ok(());
        }
        records.sort_by(|a, b| comparator.compare(a, b));

        guard.clear_records();
        for record in &records {
            // Same bytes in a different order always fit again
            if !guard.append_record(&record.encode(), self.capacity) {
                return Err(Error::TreeCorrupted {
                    page_id: page_id.0,
                    operation: "sort",
                    reason: "records no longer fit after reordering".to_string(),
                });
            }
        }
        Ok(())
    }
}
