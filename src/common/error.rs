//! Error types for bplusdb.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in bplusdb.
///
/// A page that is merely full is not an error: the index reacts to a
/// rejected append by splitting. Everything here is either an I/O failure,
/// a configuration mistake, or a sign that the stored tree is damaged.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("No free frames available in buffer pool")]
    NoFreeFrames,

    /// The provided page ID is the invalid sentinel or otherwise unusable.
    #[error("Invalid page ID: {0}")]
    InvalidPageId(u32),

    /// Stored checksum does not match the page contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// A page holds a type the caller cannot work with.
    #[error("Unexpected page type {found} on page {page_id}")]
    UnexpectedPageType { page_id: u32, found: String },

    /// Bytes read back from a page could not be decoded.
    #[error("Malformed data: {0}")]
    Malformed(String),

    /// No attribute with this name exists in the schema.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// The ordering attribute supports none of int/double/string promotion.
    #[error("Attribute {name} of type {att_type} cannot be ordered")]
    UnorderableAttribute { name: String, att_type: String },

    /// A tuple's values do not line up with the table schema.
    #[error("Tuple does not match schema: {0}")]
    SchemaMismatch(String),

    /// An encoded record is too large to be stored in the index.
    #[error("Record of {size} bytes exceeds the {max} byte limit")]
    RecordTooLarge { size: usize, max: usize },

    /// A key sorts above the ordering type's max sentinel.
    #[error("Key {0} sorts above the max sentinel")]
    KeyOutOfRange(String),

    /// Neither cut of a split produced two pages that fit.
    #[error("Split of page {page_id} cannot fit into two pages")]
    SplitOverflow { page_id: u32 },

    /// The on-disk tree violates a structural invariant.
    #[error("B+ tree corrupted at page {page_id} during {operation}: {reason}")]
    TreeCorrupted {
        page_id: u32,
        operation: &'static str,
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        let err = Error::TreeCorrupted {
            page_id: 7,
            operation: "insert",
            reason: "no child covers key 12".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "B+ tree corrupted at page 7 during insert: no child covers key 12"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_record_too_large_display() {
        let err = Error::RecordTooLarge { size: 900, max: 512 };
        assert_eq!(
            format!("{}", err),
            "Record of 900 bytes exceeds the 512 byte limit"
        );
    }
}
