//! Page header and type definitions.
//!
//! Every page starts with a [`PageHeader`] containing metadata:
//! - [`PageType`] discriminator
//! - CRC32 checksum for integrity
//! - Record count and the end of the record area

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Uninitialized or corrupted page.
    #[default]
    Invalid = 0,
    /// Table metadata (name, schema, root location).
    Meta = 1,
    /// B+ tree directory (internal) node.
    BTreeInternal = 2,
    /// B+ tree leaf node.
    BTreeLeaf = 3,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PageType::Meta,
            2 => PageType::BTreeInternal,
            3 => PageType::BTreeLeaf,
            _ => PageType::Invalid,
        }
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (9 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       2     record_count (little-endian)
/// 7       2     used_bytes (end of record area, little-endian)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero. This allows verification without special handling.
///
/// # Record area
/// `used_bytes` is an absolute offset: records occupy
/// `[PageHeader::SIZE, used_bytes)`. A zeroed page reports `used_bytes == 0`,
/// which readers treat as an empty record area.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Type of this page.
    pub page_type: PageType,
    /// CRC32 checksum of the page contents.
    pub checksum: u32,
    /// Number of records stored on the page.
    pub record_count: u16,
    /// Offset one past the last record byte.
    pub used_bytes: u16,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 9;

    /// Offset of each field within the header.
    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_RECORD_COUNT: usize = 5;
    pub const OFFSET_USED_BYTES: usize = 7;

    /// Create a header for an empty page of the given type.
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            checksum: 0,
            record_count: 0,
            used_bytes: Self::SIZE as u16,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let page_type = PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]);

        let checksum = u32::from_le_bytes([
            data[Self::OFFSET_CHECKSUM],
            data[Self::OFFSET_CHECKSUM + 1],
            data[Self::OFFSET_CHECKSUM + 2],
            data[Self::OFFSET_CHECKSUM + 3],
        ]);

        let record_count = u16::from_le_bytes([
            data[Self::OFFSET_RECORD_COUNT],
            data[Self::OFFSET_RECORD_COUNT + 1],
        ]);

        let used_bytes = u16::from_le_bytes([
            data[Self::OFFSET_USED_BYTES],
            data[Self::OFFSET_USED_BYTES + 1],
        ]);

        Self {
            page_type,
            checksum,
            record_count,
            used_bytes,
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_RECORD_COUNT..Self::OFFSET_RECORD_COUNT + 2]
            .copy_from_slice(&self.record_count.to_le_bytes());
        data[Self::OFFSET_USED_BYTES..Self::OFFSET_USED_BYTES + 2]
            .copy_from_slice(&self.used_bytes.to_le_bytes());
    }

    /// Offset one past the last record byte, normalized for zeroed pages.
    #[inline]
    pub fn record_area_end(&self) -> usize {
        (self.used_bytes as usize).max(Self::SIZE)
    }

    /// Compute CRC32 checksum of a page.
    ///
    /// The checksum field (bytes 1-4) is hashed as zeros so the checksum
    /// doesn't include itself.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Verify that the stored checksum matches the computed checksum.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}
