//! Records stored in index pages.

use crate::catalog::codec::Reader;
use crate::catalog::{AttVal, Schema, Tuple};
use crate::common::{PageId, Result};

use super::page_store::PageKind;

/// An entry of a leaf page or of a directory page.
///
/// Leaf pages hold full tuples; the key is the tuple's ordering attribute.
/// Directory pages hold `{key, child}` separators. Which variant a page
/// holds follows from the page's [`PageKind`], so both variants can flow
/// through the same comparison and split code.
///
/// # Encoding
/// ```text
/// Leaf:     tuple encoding
/// Internal: child u32 LE | key (AttVal encoding)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Leaf(Tuple),
    Internal { key: AttVal, child: PageId },
}

impl Record {
    pub fn internal(key: AttVal, child: PageId) -> Self {
        Record::Internal { key, child }
    }

    /// Kind of page this record belongs on.
    pub fn kind(&self) -> PageKind {
        match self {
            Record::Leaf(_) => PageKind::Leaf,
            Record::Internal { .. } => PageKind::Directory,
        }
    }

    /// Child pointer of an internal record.
    pub fn child(&self) -> Option<PageId> {
        match self {
            Record::Leaf(_) => None,
            Record::Internal { child, .. } => Some(*child),
        }
    }

    pub fn into_tuple(self) -> Option<Tuple> {
        match self {
            Record::Leaf(tuple) => Some(tuple),
            Record::Internal { .. } => None,
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Record::Leaf(tuple) => tuple.encoded_len(),
            Record::Internal { key, .. } => 4 + key.encoded_len(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::Leaf(tuple) => tuple.encode(),
            Record::Internal { key, child } => {
                let mut out = Vec::with_capacity(self.encoded_len());
                out.extend_from_slice(&child.to_le_bytes());
                key.encode_into(&mut out);
                out
            }
        }
    }

    /// Decode a record read from a page of `kind`.
    ///
    /// The result owns its data, independent of the page it came from.
    pub fn decode(kind: PageKind, bytes: &[u8], schema: &Schema) -> Result<Self> {
        match kind {
            PageKind::Leaf => Tuple::decode(bytes, schema).map(Record::Leaf),
            PageKind::Directory => {
                let mut reader = Reader::new(bytes);
                let child = PageId::new(reader.u32()?);
                let key = AttVal::decode_from(&mut reader)?;
                reader.finish()?;
                Ok(Record::Internal { key, child })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttType;

    #[test]
    fn test_internal_encoding_layout() {
        let record = Record::internal(AttVal::Int(5), PageId::new(3));
        let bytes = record.encode();

        assert_eq!(bytes.len(), record.encoded_len());
        assert_eq!(&bytes[..4], &[3, 0, 0, 0]);

        let schema = Schema::new();
        assert_eq!(
            Record::decode(PageKind::Directory, &bytes, &schema).unwrap(),
            record
        );
    }

    #[test]
    fn test_leaf_decode_checks_schema() {
        let schema = Schema::new().with_attribute("id", AttType::Int);
        let record = Record::Leaf(Tuple::new(vec![AttVal::Int(9)]));
        let bytes = record.encode();

        assert_eq!(Record::decode(PageKind::Leaf, &bytes, &schema).unwrap(), record);

        let other = Schema::new().with_attribute("name", AttType::String);
        assert!(Record::decode(PageKind::Leaf, &bytes, &other).is_err());
    }

    #[test]
    fn test_accessors() {
        let internal = Record::internal(AttVal::Int(1), PageId::new(8));
        assert_eq!(internal.kind(), PageKind::Directory);
        assert_eq!(internal.child(), Some(PageId::new(8)));
        assert!(internal.into_tuple().is_none());

        let leaf = Record::Leaf(Tuple::new(vec![AttVal::Int(1)]));
        assert_eq!(leaf.kind(), PageKind::Leaf);
        assert_eq!(leaf.child(), None);
    }
}
