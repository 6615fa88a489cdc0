//! Table schemas and tuples.

use crate::catalog::codec::{put_str, Reader};
use crate::catalog::value::{AttType, AttVal};
use crate::common::{Error, Result};

/// Ordered, named attributes of a table.
///
/// # Example
/// ```
/// use bplusdb::catalog::{AttType, Schema};
///
/// let schema = Schema::new()
///     .with_attribute("id", AttType::Int)
///     .with_attribute("name", AttType::String);
/// assert_eq!(schema.att_by_name("name"), Some((1, AttType::String)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    attributes: Vec<(String, AttType)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, att_type: AttType) -> Self {
        self.attributes.push((name.into(), att_type));
        self
    }

    /// Position and type of the attribute called `name`.
    pub fn att_by_name(&self, name: &str) -> Option<(usize, AttType)> {
        self.attributes
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| (i, self.attributes[i].1))
    }

    pub fn attributes(&self) -> &[(String, AttType)] {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.attributes.len() as u16).to_le_bytes());
        for (name, att_type) in &self.attributes {
            put_str(out, name);
            out.push(*att_type as u8);
        }
    }

    pub(crate) fn decode_from(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.u16()? as usize;
        let mut attributes = Vec::with_capacity(count);
        for _ in 0..count {
            let name = reader.str()?;
            let tag = reader.u8()?;
            let att_type = AttType::from_u8(tag)
                .ok_or_else(|| Error::Malformed(format!("unknown attribute type {}", tag)))?;
            attributes.push((name, att_type));
        }
        Ok(Self { attributes })
    }
}

/// One row: a value per schema attribute.
///
/// # Encoding
/// `u16` value count followed by each [`AttVal`] encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    values: Vec<AttVal>,
}

impl Tuple {
    pub fn new(values: Vec<AttVal>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[AttVal] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&AttVal> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check arity and per-attribute types against `schema`.
    ///
    /// # Errors
    /// Returns `Error::SchemaMismatch` describing the first difference.
    pub fn validate(&self, schema: &Schema) -> Result<()> {
        if self.values.len() != schema.len() {
            return Err(Error::SchemaMismatch(format!(
                "expected {} values, got {}",
                schema.len(),
                self.values.len()
            )));
        }
        for (value, (name, att_type)) in self.values.iter().zip(schema.attributes()) {
            if value.att_type() != *att_type {
                return Err(Error::SchemaMismatch(format!(
                    "attribute {} expects {}, got {}",
                    name,
                    att_type,
                    value.att_type()
                )));
            }
        }
        Ok(())
    }

    /// Bytes this tuple occupies when encoded.
    pub fn encoded_len(&self) -> usize {
        2 + self.values.iter().map(AttVal::encoded_len).sum::<usize>()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&(self.values.len() as u16).to_le_bytes());
        for value in &self.values {
            value.encode_into(&mut out);
        }
        out
    }

    /// Decode a tuple and check it against `schema`.
    pub fn decode(bytes: &[u8], schema: &Schema) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let count = reader.u16()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(AttVal::decode_from(&mut reader)?);
        }
        reader.finish()?;

        let tuple = Self { values };
        tuple
            .validate(schema)
            .map_err(|e| Error::Malformed(format!("stored tuple: {}", e)))?;
        Ok(tuple)
    }
}

impl From<Vec<AttVal>> for Tuple {
    fn from(values: Vec<AttVal>) -> Self {
        Self::new(values)
    }
}
