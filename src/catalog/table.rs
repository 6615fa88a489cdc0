//! Table metadata persisted in a dedicated meta page.

use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::catalog::codec::{check_str, put_str, Reader};
use crate::catalog::schema::Schema;
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::PageType;

/// A table's name, schema and index root location.
///
/// The metadata lives in one [`PageType::Meta`] page, stored as a single
/// record:
/// ```text
/// root u32 | name (u16 len + UTF-8) | schema (u16 count, then name + type tag)
/// ```
/// Every root change is written and flushed immediately, so reopening the
/// file with [`Table::open`] resumes at the same root.
pub struct Table {
    name: String,
    schema: Schema,
    meta_page: PageId,
    root: PageId,
    pool: Arc<BufferPoolManager>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("meta_page", &self.meta_page)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Allocate a meta page for a new, empty table.
    ///
    /// # Errors
    /// `Error::Malformed` if a table or attribute name is longer than
    /// `u16::MAX` bytes, or the metadata does not fit in one page.
    pub fn create(pool: Arc<BufferPoolManager>, name: &str, schema: Schema) -> Result<Self> {
        check_str("table name", name)?;
        for (att_name, _) in schema.attributes() {
            check_str("attribute name", att_name)?;
        }

        let meta_page = {
            let mut guard = pool.new_page()?;
            guard.init(PageType::Meta);
            guard.page_id()
        };

        let table = Self {
            name: name.to_string(),
            schema,
            meta_page,
            root: PageId::INVALID,
            pool,
        };
        table.persist()?;

        tracing::debug!(table = %table.name, meta_page = meta_page.0, "created table");
        Ok(table)
    }

    /// Load a table from its meta page.
    ///
    /// # Errors
    /// - `Error::UnexpectedPageType` if `meta_page` is not a meta page
    /// - `Error::Malformed` if the metadata cannot be decoded
    pub fn open(pool: Arc<BufferPoolManager>, meta_page: PageId) -> Result<Self> {
        let (root, name, schema) = {
            let guard = pool.fetch_page_read(meta_page)?;
            if guard.page_type() != PageType::Meta {
                return Err(Error::UnexpectedPageType {
                    page_id: meta_page.0,
                    found: format!("{:?}", guard.page_type()),
                });
            }

            let bytes = guard
                .records()
                .next()
                .ok_or_else(|| Error::Malformed(format!("meta page {} is empty", meta_page.0)))??;

            let mut reader = Reader::new(bytes);
            let root = PageId::new(reader.u32()?);
            let name = reader.str()?;
            let schema = Schema::decode_from(&mut reader)?;
            reader.finish()?;
            (root, name, schema)
        };

        tracing::debug!(table = %name, root = %root, "opened table");

        Ok(Self {
            name,
            schema,
            meta_page,
            root,
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn meta_page(&self) -> PageId {
        self.meta_page
    }

    /// Root page of the table's index, `PageId::INVALID` when empty.
    pub fn root_location(&self) -> PageId {
        self.root
    }

    /// Record a new root and write it through to disk.
    pub fn set_root_location(&mut self, root: PageId) -> Result<()> {
        self.root = root;
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.root.to_le_bytes());
        put_str(&mut bytes, &self.name);
        self.schema.encode_into(&mut bytes);

        {
            let mut guard = self.pool.fetch_page_write(self.meta_page)?;
            guard.clear_records();
            if !guard.append_record(&bytes, PAGE_SIZE) {
                return Err(Error::Malformed(format!(
                    "metadata for table {} needs {} bytes, more than a page",
                    self.name,
                    bytes.len()
                )));
            }
        }

        self.pool.flush_page(self.meta_page)
    }
}
