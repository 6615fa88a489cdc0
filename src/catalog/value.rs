//! Attribute types and values.
//!
//! [`AttType`] describes what a schema column holds and which comparison
//! domains it can be promoted into. [`AttVal`] is one concrete value.

use std::borrow::Cow;
use std::fmt;

use crate::catalog::codec::{put_str, Reader};
use crate::common::{Error, Result};

/// Largest string key: the single code point U+10FFFF.
///
/// Strings compare by UTF-8 bytes, which is code point order, so this sorts
/// after every string that does not itself start with U+10FFFF.
pub const MAX_STRING_SENTINEL: &str = "\u{10FFFF}";

/// Declared type of a schema attribute.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttType {
    Int = 0,
    Double = 1,
    String = 2,
    Bool = 3,
}

impl AttType {
    /// Convert from the on-disk tag.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AttType::Int),
            1 => Some(AttType::Double),
            2 => Some(AttType::String),
            3 => Some(AttType::Bool),
            _ => None,
        }
    }

    /// Values of this type compare correctly as `i64`.
    pub fn promotable_to_int(self) -> bool {
        matches!(self, AttType::Int)
    }

    /// Values of this type compare correctly as `f64`.
    pub fn promotable_to_double(self) -> bool {
        matches!(self, AttType::Int | AttType::Double)
    }

    /// Values of this type compare correctly as text.
    pub fn promotable_to_string(self) -> bool {
        matches!(self, AttType::Int | AttType::Double | AttType::String)
    }

    /// The largest value of this type; keys of directory sentinel entries.
    pub fn max_sentinel(self) -> AttVal {
        match self {
            AttType::Int => AttVal::Int(i64::MAX),
            AttType::Double => AttVal::Double(f64::INFINITY),
            AttType::String => AttVal::String(MAX_STRING_SENTINEL.to_string()),
            AttType::Bool => AttVal::Bool(true),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttType::Int => "int",
            AttType::Double => "double",
            AttType::String => "string",
            AttType::Bool => "bool",
        }
    }
}

impl fmt::Display for AttType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One attribute value.
///
/// # Encoding
/// ```text
/// tag u8 | payload
/// 0      | i64 LE
/// 1      | f64 LE
/// 2      | u16 LE length, UTF-8 bytes
/// 3      | u8 (0 or 1)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum AttVal {
    Int(i64),
    Double(f64),
    String(String),
    Bool(bool),
}

impl AttVal {
    pub fn att_type(&self) -> AttType {
        match self {
            AttVal::Int(_) => AttType::Int,
            AttVal::Double(_) => AttType::Double,
            AttVal::String(_) => AttType::String,
            AttVal::Bool(_) => AttType::Bool,
        }
    }

    /// Integer view. Doubles truncate toward zero; unparsable text is 0.
    pub fn to_int(&self) -> i64 {
        match self {
            AttVal::Int(v) => *v,
            AttVal::Double(v) => *v as i64,
            AttVal::String(s) => s.trim().parse().unwrap_or(0),
            AttVal::Bool(b) => i64::from(*b),
        }
    }

    /// Floating point view. Unparsable text is 0.0.
    pub fn to_double(&self) -> f64 {
        match self {
            AttVal::Int(v) => *v as f64,
            AttVal::Double(v) => *v,
            AttVal::String(s) => s.trim().parse().unwrap_or(0.0),
            AttVal::Bool(b) => f64::from(u8::from(*b)),
        }
    }

    /// Text view; borrows when the value already is a string.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            AttVal::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Bytes this value occupies when encoded.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            AttVal::Int(_) | AttVal::Double(_) => 8,
            AttVal::String(s) => 2 + s.len(),
            AttVal::Bool(_) => 1,
        }
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.att_type() as u8);
        match self {
            AttVal::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            AttVal::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
            AttVal::String(s) => put_str(out, s),
            AttVal::Bool(b) => out.push(u8::from(*b)),
        }
    }

    pub(crate) fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let tag = reader.u8()?;
        let att_type = AttType::from_u8(tag)
            .ok_or_else(|| Error::Malformed(format!("unknown value tag {}", tag)))?;

        Ok(match att_type {
            AttType::Int => AttVal::Int(reader.i64()?),
            AttType::Double => AttVal::Double(reader.f64()?),
            AttType::String => AttVal::String(reader.str()?),
            AttType::Bool => AttVal::Bool(reader.u8()? != 0),
        })
    }
}

impl fmt::Display for AttVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttVal::Int(v) => write!(f, "{}", v),
            AttVal::Double(v) => write!(f, "{}", v),
            AttVal::String(s) => f.write_str(s),
            AttVal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for AttVal {
    fn from(v: i64) -> Self {
        AttVal::Int(v)
    }
}

impl From<f64> for AttVal {
    fn from(v: f64) -> Self {
        AttVal::Double(v)
    }
}

impl From<&str> for AttVal {
    fn from(v: &str) -> Self {
        AttVal::String(v.to_string())
    }
}

impl From<String> for AttVal {
    fn from(v: String) -> Self {
        AttVal::String(v)
    }
}

impl From<bool> for AttVal {
    fn from(v: bool) -> Self {
        AttVal::Bool(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_ladder() {
        assert!(AttType::Int.promotable_to_int());
        assert!(!AttType::Double.promotable_to_int());
        assert!(AttType::Double.promotable_to_double());
        assert!(AttType::String.promotable_to_string());
        assert!(!AttType::String.promotable_to_double());

        let bool_type = AttType::Bool;
        assert!(!bool_type.promotable_to_int());
        assert!(!bool_type.promotable_to_double());
        assert!(!bool_type.promotable_to_string());
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(AttType::Int.max_sentinel(), AttVal::Int(i64::MAX));
        assert_eq!(AttType::Double.max_sentinel().to_double(), f64::INFINITY);
        let sentinel = AttType::String.max_sentinel().to_string();
        assert!(sentinel.as_str() > "zzzz\u{FFFF}");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(AttVal::Double(7.9).to_int(), 7);
        assert_eq!(AttVal::from(" 42 ").to_int(), 42);
        assert_eq!(AttVal::from("nope").to_double(), 0.0);
        assert_eq!(AttVal::Int(3).to_text(), "3");
        assert_eq!(AttVal::Bool(true).to_int(), 1);
    }

    #[test]
    fn test_encoded_len_matches_encoding() {
        let values = [
            AttVal::Int(-1),
            AttVal::Double(2.5),
            AttVal::from("key"),
            AttVal::Bool(false),
        ];
        for value in &values {
            let mut out = Vec::new();
            value.encode_into(&mut out);
            assert_eq!(out.len(), value.encoded_len());

            let mut reader = Reader::new(&out);
            assert_eq!(&AttVal::decode_from(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let mut reader = Reader::new(&[9, 0, 0]);
        assert!(matches!(
            AttVal::decode_from(&mut reader),
            Err(Error::Malformed(_))
        ));
    }
}
