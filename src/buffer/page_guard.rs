//! RAII guards for page access.
//!
//! A guard holds the frame's lock and a pin. Dropping it releases the lock
//! first and then the pin. Index code keeps a guard only for the duration
//! of one page operation and never across a recursive call.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// A pinned frame. Unpins on drop, reporting whether the page was written.
struct Pin<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    dirty: bool,
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        self.bpm.unpin_page_internal(self.frame_id, self.dirty);
    }
}

/// Shared read access to a resident page.
pub struct PageReadGuard<'a> {
    // Declared before `pin` so the lock is released before the unpin
    lock: RwLockReadGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            lock,
            pin: Pin {
                bpm,
                frame_id,
                page_id,
                dirty: false,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

/// Exclusive access to a resident page.
///
/// The frame becomes dirty on the first mutable access, so a guard that
/// only reads never causes a write-back.
pub struct PageWriteGuard<'a> {
    lock: RwLockWriteGuard<'a, Page>,
    pin: Pin<'a>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            lock,
            pin: Pin {
                bpm,
                frame_id,
                page_id,
                dirty: false,
            },
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    /// Whether the page has been handed out mutably through this guard.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.pin.dirty
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.pin.dirty = true;
        &mut self.lock
    }
}
