//! Little-endian byte cursor shared by tuple, record and metadata encodings.

use crate::common::{Error, Result};

/// Reads fixed-width little-endian fields off a byte slice.
///
/// Every read checks bounds and reports `Error::Malformed` on truncation,
/// so decoding a damaged page never panics.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                Error::Malformed(format!(
                    "need {} bytes at offset {}, have {}",
                    len,
                    self.pos,
                    self.buf.len() - self.pos
                ))
            })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        self.array().map(u16::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.array().map(u32::from_le_bytes)
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        self.array().map(i64::from_le_bytes)
    }

    pub(crate) fn f64(&mut self) -> Result<f64> {
        self.array().map(f64::from_le_bytes)
    }

    /// A `u16` length followed by that many UTF-8 bytes.
    pub(crate) fn str(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Malformed(format!("invalid UTF-8: {}", e)))
    }

    /// Fail unless every byte has been consumed.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(Error::Malformed(format!(
                "{} trailing bytes",
                self.buf.len() - self.pos
            )))
        }
    }
}

/// Fail unless `s` fits a `u16` length prefix.
pub(crate) fn check_str(what: &str, s: &str) -> Result<()> {
    if s.len() > u16::MAX as usize {
        return Err(Error::Malformed(format!(
            "{} of {} bytes exceeds the {} byte limit",
            what,
            s.len(),
            u16::MAX
        )));
    }
    Ok(())
}

/// Append a `u16`-length-prefixed string.
///
/// Callers pass strings already bounded by [`check_str`] or by the record
/// size limit.
pub(crate) fn put_str(out: &mut Vec<u8>, s: &str) {
    debug_assert!(s.len() <= u16::MAX as usize);
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_fields() {
        let mut buf = vec![7u8];
        buf.extend_from_slice(&513u16.to_le_bytes());
        buf.extend_from_slice(&(-5i64).to_le_bytes());
        put_str(&mut buf, "héllo");

        let mut reader = Reader::new(&buf);
        assert_eq!(reader.u8().unwrap(), 7);
        assert_eq!(reader.u16().unwrap(), 513);
        assert_eq!(reader.i64().unwrap(), -5);
        assert_eq!(reader.str().unwrap(), "héllo");
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_reader_truncation() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert!(matches!(reader.u32(), Err(Error::Malformed(_))));
    }

    #[test]
    fn test_string_length_limit() {
        assert!(check_str("name", &"x".repeat(u16::MAX as usize)).is_ok());
        assert!(matches!(
            check_str("name", &"é".repeat(40_000)),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut reader = Reader::new(&[1, 2]);
        reader.u8().unwrap();
        assert!(reader.finish().is_err());
    }
}
