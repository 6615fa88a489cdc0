//! Buffer Pool Manager - the page caching layer under the index.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting through RAII guards
//! - Dirty page write-back (with checksum stamping) on eviction and flush
//! - LRU eviction

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskManager;

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │ Vec<FrameId> │  │ LruReplacer  │  │   Mutex      │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Page identity
/// [`new_page`](Self::new_page) always yields id = current page count of
/// the file. Pages are never deleted, so ids are never reused.
///
/// # Locking
/// Flushing takes the page's write lock to stamp the checksum. Do not call
/// [`flush_page`](Self::flush_page) or [`flush_all_pages`](Self::flush_all_pages)
/// while holding a guard on a page that may be flushed.
pub struct BufferPoolManager {
    frames: Vec<Frame>,
    page_table: RwLock<HashMap<PageId, FrameId>>,
    /// Stack of free frame IDs (LIFO for cache locality).
    free_list: Mutex<Vec<FrameId>>,
    replacer: Mutex<LruReplacer>,
    disk_manager: Mutex<DiskManager>,
    stats: BufferPoolStats,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager with `pool_size` frames.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        Self {
            frames: (0..pool_size).map(|_| Frame::new()).collect(),
            page_table: RwLock::new(HashMap::new()),
            free_list: Mutex::new((0..pool_size).rev().map(FrameId::new).collect()),
            replacer: Mutex::new(LruReplacer::new()),
            disk_manager: Mutex::new(disk_manager),
            stats: BufferPoolStats::new(),
        }
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page for reading (shared access).
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - `Error::NoFreeFrames` if all frames are pinned
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.index()].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// The page is marked dirty once it is borrowed mutably through the guard.
    ///
    /// # Errors
    /// - `Error::PageNotFound` if the page doesn't exist on disk
    /// - `Error::NoFreeFrames` if all frames are pinned
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page_internal(page_id)?;
        let lock = self.frames[frame_id.index()].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Append a zeroed page to the file and pin it for writing.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if all frames are pinned
    /// - I/O errors from disk allocation
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.get_free_frame()?;

        let allocated = self.disk_manager.lock().allocate_page();
        let page_id = match allocated {
            Ok(pid) => pid,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };
        BufferPoolStats::bump(&self.stats.pages_allocated);

        let frame = &self.frames[frame_id.index()];
        frame.page_mut().reset();
        self.install(frame_id, page_id);

        tracing::trace!(page_id = page_id.0, %frame_id, "allocated page");

        let lock = frame.page_mut();
        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Flush a specific page to disk if it's resident and dirty.
    ///
    /// # Errors
    /// - I/O errors from disk write
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let frame_id = match self.page_table.read().get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(()),
        };

        self.flush_frame(frame_id, page_id)
    }

    /// Flush all dirty pages to disk.
    ///
    /// # Errors
    /// - I/O errors from disk writes
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages: Vec<(PageId, FrameId)> = self
            .page_table
            .read()
            .iter()
            .map(|(&pid, &fid)| (pid, fid))
            .collect();

        for (page_id, frame_id) in pages {
            self.flush_frame(frame_id, page_id)?;
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Number of pages currently resident in the pool.
    pub fn resident_page_count(&self) -> usize {
        self.page_table.read().len()
    }

    /// Number of pages in the database file; also the id of the next page.
    pub fn disk_page_count(&self) -> u32 {
        self.disk_manager.lock().page_count()
    }

    /// Pin count of a resident page, or None if it is not in the pool.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let frame_id = *self.page_table.read().get(&page_id)?;
        Some(self.frames[frame_id.index()].pin_count())
    }

    // ========================================================================
    // Internal: Called by page guards on drop
    // ========================================================================

    pub(crate) fn unpin_page_internal(&self, frame_id: FrameId, is_dirty: bool) {
        let frame = &self.frames[frame_id.index()];

        if is_dirty {
            frame.mark_dirty();
        }

        if frame.unpin() == 0 {
            self.replacer.lock().set_evictable(frame_id, true);
        }
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    fn fetch_page_internal(&self, page_id: PageId) -> Result<FrameId> {
        if !page_id.is_valid() {
            return Err(Error::InvalidPageId(page_id.0));
        }

        let resident = self.page_table.read().get(&page_id).copied();
        if let Some(frame_id) = resident {
            self.frames[frame_id.index()].pin();
            self.touch(frame_id);
            BufferPoolStats::bump(&self.stats.cache_hits);
            return Ok(frame_id);
        }

        self.load_from_disk(page_id)
    }

    fn load_from_disk(&self, page_id: PageId) -> Result<FrameId> {
        BufferPoolStats::bump(&self.stats.cache_misses);

        let frame_id = self.get_free_frame()?;

        let read = self.disk_manager.lock().read_page(page_id);
        let page_data = match read {
            Ok(page) => page,
            Err(e) => {
                self.free_list.lock().push(frame_id);
                return Err(e);
            }
        };
        BufferPoolStats::bump(&self.stats.pages_read);

        let frame = &self.frames[frame_id.index()];
        frame
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page_data.as_slice());
        self.install(frame_id, page_id);

        tracing::trace!(page_id = page_id.0, %frame_id, "loaded page");
        Ok(frame_id)
    }

    /// Bind a frame to a page, pin it once and register it everywhere.
    fn install(&self, frame_id: FrameId, page_id: PageId) {
        let frame = &self.frames[frame_id.index()];
        frame.assign(page_id);
        frame.pin();

        self.page_table.write().insert(page_id, frame_id);
        self.touch(frame_id);
    }

    /// Record an access to a pinned frame.
    fn touch(&self, frame_id: FrameId) {
        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id);
        replacer.set_evictable(frame_id, false);
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    fn get_free_frame(&self) -> Result<FrameId> {
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }

        self.evict_page()
    }

    fn evict_page(&self) -> Result<FrameId> {
        let frame_id = self.replacer.lock().evict().ok_or(Error::NoFreeFrames)?;
        let frame = &self.frames[frame_id.index()];

        if let Some(old_page_id) = frame.page_id() {
            if let Err(e) = self.flush_frame(frame_id, old_page_id) {
                // Keep the page resident and evictable; the write can be retried.
                let mut replacer = self.replacer.lock();
                replacer.record_access(frame_id);
                replacer.set_evictable(frame_id, true);
                return Err(e);
            }
            self.page_table.write().remove(&old_page_id);
            tracing::trace!(page_id = old_page_id.0, %frame_id, "evicted page");
        }

        frame.release();
        BufferPoolStats::bump(&self.stats.evictions);
        Ok(frame_id)
    }

    /// Stamp the checksum and write the frame's page if it is dirty.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.index()];

        if !frame.is_dirty() {
            return Ok(());
        }

        {
            let mut page = frame.page_mut();
            page.update_checksum();
            self.disk_manager.lock().write_page(page_id, &page)?;
        }

        frame.take_dirty();
        BufferPoolStats::bump(&self.stats.pages_written);
        Ok(())
    }
}
