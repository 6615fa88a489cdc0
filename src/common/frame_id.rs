//! Buffer pool frame slots.

use std::fmt;

/// Slot of a frame in the buffer pool.
///
/// Frame ids are dense, `0..pool_size`, and never outlive the pool that
/// issued them. Unlike a [`PageId`](super::PageId) they are not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    #[inline]
    pub fn new(slot: usize) -> Self {
        FrameId(slot)
    }

    /// Position in the pool's frame vector.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for FrameId {
    fn from(slot: usize) -> Self {
        FrameId(slot)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_id_slot() {
        let frame = FrameId::from(3);
        assert_eq!(frame, FrameId::new(3));
        assert_eq!(frame.index(), 3);
        assert_eq!(frame.to_string(), "frame#3");
        assert!(FrameId::new(1) < FrameId::new(2));
    }
}
