//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between disk and memory. On top of the raw bytes it offers a simple
//! record area: length-prefixed records appended one after another behind
//! the [`PageHeader`].
//!
//! ```text
//! ┌──────────┬─────┬──────────┬─────┬──────────┬───────────────┐
//! │  header  │ len │ record 0 │ len │ record 1 │     free      │
//! │ 9 bytes  │ u16 │          │ u16 │          │               │
//! └──────────┴─────┴──────────┴─────┴──────────┴───────────────┘
//!                                              ↑ used_bytes
//! ```

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};

use super::page_header::{PageHeader, PageType};

/// Bytes of bookkeeping stored in front of every record.
pub const RECORD_OVERHEAD: usize = 2;

/// A page of data (4KB, 4KB-aligned).
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code: copying 4KB should
/// be explicit. A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use bplusdb::storage::page::{Page, PageType};
///
/// let mut page = Page::new();
/// page.init(PageType::BTreeLeaf);
/// assert!(page.append_record(b"hello", 64));
/// assert_eq!(page.record_count(), 1);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Zero the page and stamp an empty header of the given type.
    pub fn init(&mut self, page_type: PageType) {
        self.reset();
        self.set_header(&PageHeader::new(page_type));
    }

    /// Read the page header.
    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    /// Write a page header.
    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Type tag from the header.
    #[inline]
    pub fn page_type(&self) -> PageType {
        self.header().page_type
    }

    /// Retag the page, keeping its records.
    pub fn set_page_type(&mut self, page_type: PageType) {
        let mut header = self.header();
        header.page_type = page_type;
        self.set_header(&header);
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        self.data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
    }

    /// Verify the page checksum is valid.
    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }

    // ========================================================================
    // Record area
    // ========================================================================

    /// Number of records on the page.
    #[inline]
    pub fn record_count(&self) -> usize {
        self.header().record_count as usize
    }

    /// Bytes in use, header included.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.header().record_area_end()
    }

    /// Append a record if it fits within the first `capacity` bytes.
    ///
    /// Returns `false` and leaves the page untouched when it does not fit.
    pub fn append_record(&mut self, record: &[u8], capacity: usize) -> bool {
        let mut header = self.header();
        let start = header.record_area_end();
        let end = start + RECORD_OVERHEAD + record.len();

        if end > capacity.min(PAGE_SIZE) || record.len() > u16::MAX as usize {
            return false;
        }

        self.data[start..start + RECORD_OVERHEAD]
            .copy_from_slice(&(record.len() as u16).to_le_bytes());
        self.data[start + RECORD_OVERHEAD..end].copy_from_slice(record);

        header.record_count += 1;
        header.used_bytes = end as u16;
        self.set_header(&header);
        true
    }

    /// Drop every record, keeping the page type.
    pub fn clear_records(&mut self) {
        let page_type = self.page_type();
        self.init(page_type);
    }

    /// Iterate over the raw bytes of each record, in storage order.
    pub fn records(&self) -> RecordBytes<'_> {
        let header = self.header();
        RecordBytes {
            data: &self.data,
            offset: PageHeader::SIZE,
            end: header.record_area_end().min(PAGE_SIZE),
            remaining: header.record_count as usize,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

/// Iterator over the records of a [`Page`].
///
/// Yields `Error::Malformed` (once) if a length prefix runs past the
/// record area.
pub struct RecordBytes<'a> {
    data: &'a [u8],
    offset: usize,
    end: usize,
    remaining: usize,
}

impl<'a> Iterator for RecordBytes<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let body = self.offset + RECORD_OVERHEAD;
        if body > self.end {
            self.remaining = 0;
            return Some(Err(Error::Malformed(format!(
                "record length prefix at offset {} overruns record area",
                self.offset
            ))));
        }

        let len = u16::from_le_bytes([self.data[self.offset], self.data[self.offset + 1]]) as usize;
        if body + len > self.end {
            self.remaining = 0;
            return Some(Err(Error::Malformed(format!(
                "record of {} bytes at offset {} overruns record area",
                len, self.offset
            ))));
        }

        self.offset = body + len;
        self.remaining -= 1;
        Some(Ok(&self.data[body..body + len]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

// ============================================================================
// TESTS
// ============================================================================
