//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the bookkeeping the pool needs:
//! which page is resident, how many guards pin it, and whether it must be
//! written back before reuse.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// A frame in the buffer pool.
///
/// All fields use interior mutability so the pool can hand out `&Frame`
/// to many guards at once:
/// - `page`: `RwLock`, shared readers or one writer
/// - `resident`: `Mutex`, changes only on load and eviction
/// - `pins` / `dirty`: atomics, touched on every guard drop
pub struct Frame {
    page: RwLock<Page>,
    resident: Mutex<Option<PageId>>,
    pins: AtomicU32,
    dirty: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            resident: Mutex::new(None),
            pins: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Page currently held by this frame, if any.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        *self.resident.lock()
    }

    /// Bind the frame to `page_id` with a clean dirty flag.
    pub fn assign(&self, page_id: PageId) {
        *self.resident.lock() = Some(page_id);
        self.dirty.store(false, Ordering::Relaxed);
    }

    /// Unbind the frame after eviction.
    pub fn release(&self) {
        *self.resident.lock() = None;
        self.dirty.store(false, Ordering::Relaxed);
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pins.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if pin count is already 0; every unpin must match a pin.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pins.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pins.load(Ordering::Relaxed)
    }

    /// Mark the frame as modified since it was loaded.
    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Check if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Clear the dirty flag, returning whether it was set.
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
