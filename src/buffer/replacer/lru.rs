//! LRU (Least Recently Used) replacement policy.

use std::collections::{HashMap, HashSet};

use crate::common::FrameId;

/// Evicts the evictable frame whose last access is the oldest.
///
/// Each access stamps the frame with a monotonically increasing tick.
/// A B+ tree descent touches the root on every operation, so recency keeps
/// the upper levels resident while cold leaves are recycled.
pub struct LruReplacer {
    /// Tick handed to the next access.
    clock: u64,

    /// Last access tick per tracked frame.
    last_access: HashMap<FrameId, u64>,

    /// Frames that are currently evictable (pin_count == 0).
    evictable: HashSet<FrameId>,
}

impl LruReplacer {
    /// Create an empty replacer.
    pub fn new() -> Self {
        Self {
            clock: 0,
            last_access: HashMap::new(),
            evictable: HashSet::new(),
        }
    }

    /// Record that a frame was accessed now.
    pub fn record_access(&mut self, frame_id: FrameId) {
        self.clock += 1;
        self.last_access.insert(frame_id, self.clock);
    }

    /// Mark a frame as evictable or pinned.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) {
        if evictable {
            self.evictable.insert(frame_id);
        } else {
            self.evictable.remove(&frame_id);
        }
    }

    /// Select and forget the least recently used evictable frame.
    ///
    /// Returns None if every tracked frame is pinned.
    pub fn evict(&mut self) -> Option<FrameId> {
        let victim = self
            .evictable
            .iter()
            .min_by_key(|fid| self.last_access.get(fid).copied().unwrap_or(0))
            .copied()?;

        self.evictable.remove(&victim);
        self.last_access.remove(&victim);
        Some(victim)
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.evictable.len()
    }
}

impl Default for LruReplacer {
    fn default() -> Self {
        Self::new()
    }
}
