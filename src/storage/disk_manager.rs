//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating new pages
//! - Verifying page checksums on the way in

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::{MAX_PAGES, PAGE_SIZE};
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageType};

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// Pages are laid out sequentially; page N starts at offset `N × PAGE_SIZE`.
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │  ...    │ Page N  │
/// └─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// # Integrity
/// Pages written through the buffer pool carry a CRC32 checksum. Pages that
/// were allocated but never written are all zeros and have type
/// [`PageType::Invalid`]; those are returned without verification.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` serializes
/// access to it.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path.as_ref())?;

        tracing::debug!(path = %path.as_ref().display(), "created database file");

        Ok(Self {
            file,
            page_count: 0,
        })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;

        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        tracing::debug!(
            path = %path.as_ref().display(),
            page_count,
            "opened database file"
        );

        Ok(Self { file, page_count })
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist
    /// - `Error::ChecksumMismatch` if an initialized page fails verification
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        self.check_bounds(page_id)?;

        self.file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        if page.page_type() != PageType::Invalid && !page.verify_checksum() {
            tracing::warn!(page_id = page_id.0, "checksum mismatch on read");
            return Err(Error::ChecksumMismatch(page_id.0));
        }

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    /// The caller is responsible for stamping the checksum first.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.check_bounds(page_id)?;

        self.file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Allocate a new zeroed page at the end of the file.
    ///
    /// The new page's id is always the current page count.
    ///
    /// # Errors
    /// Returns `Error::InvalidPageId` once the id space is exhausted.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        if u64::from(self.page_count) >= MAX_PAGES {
            return Err(Error::InvalidPageId(self.page_count));
        }
        let page_id = PageId::new(self.page_count);

        self.file.seek(SeekFrom::Start(Self::offset_of(page_id)))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.sync_all()?;

        self.page_count += 1;
        Ok(page_id)
    }

    /// Get the number of pages in the database.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    fn check_bounds(&self, page_id: PageId) -> Result<()> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }
        Ok(())
    }

    #[inline]
    fn offset_of(page_id: PageId) -> u64 {
        (page_id.0 as u64) * (PAGE_SIZE as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn leaf_page_with(byte: u8) -> Page {
        let mut page = Page::new();
        page.init(PageType::BTreeLeaf);
        page.append_record(&[byte; 4], PAGE_SIZE);
        page.update_checksum();
        page
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn test_allocate_assigns_sequential_ids() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();

        for i in 0..5 {
            assert_eq!(dm.allocate_page().unwrap(), PageId::new(i));
        }
        assert_eq!(dm.page_count(), 5);
        assert_eq!(dm.file_size(), 5 * PAGE_SIZE as u64);

        // Never-written pages come back zeroed
        let page = dm.read_page(PageId::new(3)).unwrap();
        assert_eq!(page.page_type(), PageType::Invalid);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::create(&path).unwrap();
            let pid = dm.allocate_page().unwrap();
            dm.write_page(pid, &leaf_page_with(0x42)).unwrap();
        }

        let mut dm = DiskManager::open(&path).unwrap();
        assert_eq!(dm.page_count(), 1);
        let page = dm.read_page(PageId::new(0)).unwrap();
        let record = page.records().next().unwrap().unwrap();
        assert_eq!(record, &[0x42; 4]);
    }

    #[test]
    fn test_checksum_mismatch_detected() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();
        let pid = dm.allocate_page().unwrap();

        let mut page = leaf_page_with(0x11);
        // Damage the record after the checksum was stamped
        page.as_mut_slice()[20] ^= 0xFF;
        dm.write_page(pid, &page).unwrap();

        assert!(matches!(dm.read_page(pid), Err(Error::ChecksumMismatch(0))));
    }

    #[test]
    fn test_out_of_range_pages() {
        let dir = tempdir().unwrap();
        let mut dm = DiskManager::create(dir.path().join("test.db")).unwrap();
        dm.allocate_page().unwrap();

        assert!(matches!(dm.read_page(PageId::new(1)), Err(Error::PageNotFound(1))));
        assert!(matches!(
            dm.write_page(PageId::INVALID, &Page::new()),
            Err(Error::InvalidPageId(_))
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.allocate_page().unwrap();
        }

        let dm = DiskManager::open_or_create(&path).unwrap();
        assert_eq!(dm.page_count(), 1);
    }
}
