//! The tree handle and its root manager.

use std::sync::Arc;

use tracing::debug;

use crate::buffer::BufferPoolManager;
use crate::catalog::{AttVal, Table, Tuple};
use crate::common::{Error, IndexConfig, PageId, Result};

use super::comparator::{KeyComparator, OrderingMode};
use super::iterator::{PageListIter, SortedRangeIter};
use super::page_store::{PageKind, PageStore};
use super::record::Record;

/// A B+ tree over one table, ordered by one attribute.
///
/// The root id is the only tree-shape metadata. It is owned here and
/// mirrored into the table's meta page on every change, so a tree built over
/// a reopened table resumes where it left off. [`PageId::INVALID`] means the
/// tree has never been written to.
///
/// Mutation takes `&mut self`; reads take `&self`. The tree adds no locking
/// of its own.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use bplusdb::{AttType, AttVal, BPlusTree, BufferPoolManager, DiskManager,
///     IndexConfig, Schema, Table, Tuple};
///
/// let dir = tempfile::tempdir().unwrap();
/// let dm = DiskManager::create(dir.path().join("people.db")).unwrap();
/// let config = IndexConfig::default();
/// let pool = Arc::new(BufferPoolManager::new(config.pool_size, dm));
///
/// let schema = Schema::new().with_attribute("id", AttType::Int);
/// let table = Table::create(Arc::clone(&pool), "people", schema).unwrap();
/// let mut tree = BPlusTree::new("id", table, pool, config).unwrap();
///
/// for id in [5, 1, 3] {
///     tree.append(Tuple::new(vec![AttVal::Int(id)])).unwrap();
/// }
/// let ids: Vec<i64> = tree
///     .sorted_range_iter(&AttVal::Int(2), &AttVal::Int(5))
///     .unwrap()
///     .map(|t| t.values()[0].to_int())
///     .collect();
/// assert_eq!(ids, vec![3, 5]);
/// ```
pub struct BPlusTree {
    pub(super) table: Table,
    pub(super) store: PageStore,
    pub(super) comparator: KeyComparator,
    pub(super) sentinel: AttVal,
    ordering_att: String,
    root: PageId,
}

impl BPlusTree {
    /// Build a tree over `table`, ordered by the attribute `ordering_att_name`.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `config` is out of range
    /// - `Error::UnknownAttribute` if the schema has no such attribute
    /// - `Error::UnorderableAttribute` if its type promotes to none of
    ///   int, double or string
    pub fn new(
        ordering_att_name: &str,
        table: Table,
        pool: Arc<BufferPoolManager>,
        config: IndexConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (index, att_type) = table
            .schema()
            .att_by_name(ordering_att_name)
            .ok_or_else(|| Error::UnknownAttribute(ordering_att_name.to_string()))?;
        let mode =
            OrderingMode::for_type(att_type).ok_or_else(|| Error::UnorderableAttribute {
                name: ordering_att_name.to_string(),
                att_type: att_type.to_string(),
            })?;

        let store = PageStore::new(pool, Arc::new(table.schema().clone()), config.page_capacity);
        let root = table.root_location();

        debug!(
            table = table.name(),
            ordering_att = ordering_att_name,
            ?mode,
            root = %root,
            capacity = config.page_capacity,
            "opened B+ tree"
        );

        Ok(Self {
            store,
            comparator: KeyComparator::new(mode, index),
            sentinel: att_type.max_sentinel(),
            ordering_att: ordering_att_name.to_string(),
            root,
            table,
        })
    }

    /// Current root page, `PageId::INVALID` while empty.
    pub fn root(&self) -> PageId {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        !self.root.is_valid()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Give the table back, e.g. to build another index over it.
    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn ordering_attribute(&self) -> &str {
        &self.ordering_att
    }

    pub fn comparator(&self) -> &KeyComparator {
        &self.comparator
    }

    pub fn page_capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Write every dirty page back to disk.
    pub fn flush(&self) -> Result<()> {
        self.store.pool().flush_all_pages()
    }

    /// Tuples of every leaf that may hold keys in `[low, high]`, in leaf
    /// order and unfiltered. Records on each page come out in page order.
    pub fn range_iter(&self, low: &AttVal, high: &AttVal) -> Result<PageListIter> {
        let pages = self.discover(low, high)?;
        Ok(PageListIter::new(self.store.clone(), pages))
    }

    /// Tuples with `low <= key <= high`, globally ascending by key.
    pub fn sorted_range_iter(&self, low: &AttVal, high: &AttVal) -> Result<SortedRangeIter> {
        let pages = self.discover(low, high)?;
        SortedRangeIter::new(&self.store, &pages, low, high, self.comparator)
    }

    /// Record a new root and persist it through the table.
    fn set_root(&mut self, root: PageId) -> Result<()> {
        self.table.set_root_location(root)?;
        self.root = root;
        Ok(())
    }

    /// First insert: a directory root holding `{sentinel -> empty leaf}`.
    pub(super) fn bootstrap(&mut self) -> Result<()> {
        let root = self.store.allocate(PageKind::Directory)?;
        let leaf = self.store.allocate(PageKind::Leaf)?;

        let entry = Record::internal(self.sentinel.clone(), leaf);
        if !self.store.append(root, &entry)? {
            return Err(Error::SplitOverflow { page_id: root.0 });
        }
        self.set_root(root)?;

        debug!(root = %root, leaf = %leaf, "bootstrapped empty tree");
        Ok(())
    }

    /// Root split: a new root over `promoted` and `{sentinel -> old root}`.
    pub(super) fn grow(&mut self, promoted: Record) -> Result<()> {
        let old_root = self.root;
        let new_root = self.store.allocate(PageKind::Directory)?;

        let rest = Record::internal(self.sentinel.clone(), old_root);
        for entry in [&promoted, &rest] {
            if !self.store.append(new_root, entry)? {
                return Err(Error::SplitOverflow {
                    page_id: new_root.0,
                });
            }
        }
        self.store.sort_in_place(new_root, &self.comparator)?;
        self.set_root(new_root)?;

        debug!(old_root = %old_root, new_root = %new_root, "root split, tree grew one level");
        Ok(())
    }

    /// Reject a leaf record the tree cannot store.
    pub(super) fn check_record(&self, tuple: Tuple) -> Result<Record> {
        tuple.validate(self.table.schema())?;

        let key = self.comparator.tuple_key(&tuple);
        if self.comparator.mode().less(&self.sentinel, key) {
            return Err(Error::KeyOutOfRange(key.to_string()));
        }

        let record = Record::Leaf(tuple);
        let size = PageStore::slot_size(&record);
        let max = self.store.max_record_size();
        if size > max {
            return Err(Error::RecordTooLarge { size, max });
        }
        Ok(record)
    }
}
