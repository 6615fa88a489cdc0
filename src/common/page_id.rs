//! Page identifier type.

use std::fmt;

/// Identifies a page in the database file.
///
/// Page `N` lives at file offset `N × PAGE_SIZE`. Ids are handed out in
/// allocation order (a new page always gets id = current page count) and
/// are never reused.
///
/// # Example
/// ```
/// use bplusdb::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(PageId::from_le_bytes(page_id.to_le_bytes()), page_id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// "No page".
    ///
    /// An index whose root is `INVALID` holds zero records.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Little-endian encoding used inside pages.
    #[inline]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Inverse of [`PageId::to_le_bytes`].
    #[inline]
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        PageId(u32::from_le_bytes(bytes))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Page({})", self.0)
        } else {
            write!(f, "Page(INVALID)")
        }
    }
}
