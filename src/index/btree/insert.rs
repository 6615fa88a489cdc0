//! Insertion with split propagation.

use tracing::error;

use crate::catalog::Tuple;
use crate::common::{Error, PageId, Result};

use super::page_store::PageKind;
use super::record::Record;
use super::tree::BPlusTree;

impl BPlusTree {
    /// Insert one tuple.
    ///
    /// # Errors
    /// - `Error::SchemaMismatch` if the tuple does not match the table
    /// - `Error::KeyOutOfRange` if its key sorts above the max sentinel
    /// - `Error::RecordTooLarge` if it exceeds a quarter of a page
    /// - `Error::TreeCorrupted` if the stored tree is damaged
    pub fn append(&mut self, tuple: Tuple) -> Result<()> {
        let record = self.check_record(tuple)?;

        if self.is_empty() {
            self.bootstrap()?;
        }

        if let Some(promoted) = self.insert_at(self.root(), record)? {
            self.grow(promoted)?;
        }
        Ok(())
    }

    /// Insert `record` into the subtree rooted at `page_id`.
    ///
    /// Returns the separator to add to the parent if `page_id` split.
    pub(super) fn insert_at(&self, page_id: PageId, record: Record) -> Result<Option<Record>> {
        match self.store.kind(page_id)? {
            PageKind::Leaf => {
                if self.store.append(page_id, &record)? {
                    self.store.sort_in_place(page_id, &self.comparator)?;
                    Ok(None)
                } else {
                    self.split(page_id, record, None).map(Some)
                }
            }
            PageKind::Directory => {
                let (slot, child) = self.route(page_id, &record)?;
                let Some(promoted) = self.insert_at(child, record)? else {
                    return Ok(None);
                };

                // The new page holds the lower half of `child`, so its
                // separator goes right before the entry for `child`
                if self.store.insert(page_id, slot, &promoted)? {
                    Ok(None)
                } else {
                    self.split(page_id, promoted, Some(slot)).map(Some)
                }
            }
        }
    }

    /// Position and child of the first entry whose key is not below the
    /// record's key.
    fn route(&self, page_id: PageId, record: &Record) -> Result<(usize, PageId)> {
        for (slot, entry) in self.store.records(page_id)?.into_iter().enumerate() {
            let covers = self.comparator.build_less_or_equal(record, &entry);
            if covers() {
                if let Some(child) = entry.child() {
                    return Ok((slot, child));
                }
            }
        }

        let key = self.comparator.key_of(record);
        error!(page = %page_id, key = %key, "no directory entry covers key");
        Err(Error::TreeCorrupted {
            page_id: page_id.0,
            operation: "insert",
            reason: format!("no entry covers key {}", key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::buffer::BufferPoolManager;
    use crate::catalog::{AttType, AttVal, Schema, Table};
    use crate::common::IndexConfig;
    use crate::storage::DiskManager;
    use tempfile::TempDir;

    fn tree(capacity: usize) -> (TempDir, BPlusTree) {
        let dir = tempfile::tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("insert.db")).unwrap();
        let pool = Arc::new(BufferPoolManager::new(16, dm));
        let schema = Schema::new().with_attribute("id", AttType::Int);
        let table = Table::create(Arc::clone(&pool), "t", schema).unwrap();
        let config = IndexConfig::default().with_page_capacity(capacity);
        (dir, BPlusTree::new("id", table, pool, config).unwrap())
    }

    fn tuple(id: i64) -> Tuple {
        Tuple::new(vec![AttVal::Int(id)])
    }

    fn keys(tree: &BPlusTree, page: PageId) -> Vec<i64> {
        tree.store
            .records(page)
            .unwrap()
            .iter()
            .map(|r| tree.comparator.key_of(r).to_int())
            .collect()
    }

    #[test]
    fn test_single_insert() {
        let (_dir, mut tree) = tree(61);
        tree.append(tuple(42)).unwrap();

        let root = tree.store.records(tree.root()).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(tree.comparator.key_of(&root[0]), &AttVal::Int(i64::MAX));

        let leaf = root[0].child().unwrap();
        assert_eq!(keys(&tree, leaf), vec![42]);
    }

    #[test]
    fn test_leaf_stays_sorted() {
        let (_dir, mut tree) = tree(256);
        for id in [9, 3, 7, 1] {
            tree.append(tuple(id)).unwrap();
        }

        let leaf = tree.store.records(tree.root()).unwrap()[0].child().unwrap();
        assert_eq!(keys(&tree, leaf), vec![1, 3, 7, 9]);
    }

    #[test]
    fn test_leaf_split_adds_separator() {
        let (_dir, mut tree) = tree(61);
        for id in [5, 1, 9, 3, 7] {
            tree.append(tuple(id)).unwrap();
        }

        // 5 sorted keys split 2 / 3, separator is 3
        assert_eq!(keys(&tree, tree.root()), vec![3, i64::MAX]);
        let root = tree.store.records(tree.root()).unwrap();
        assert_eq!(keys(&tree, root[0].child().unwrap()), vec![1, 3]);
        assert_eq!(keys(&tree, root[1].child().unwrap()), vec![5, 7, 9]);
    }

    #[test]
    fn test_duplicate_runs_keep_leaf_order() {
        let (_dir, mut tree) = tree(61);
        for id in [3, 5, 5, 5, 5, 5, 5, 5, 5, 5] {
            tree.append(tuple(id)).unwrap();
        }

        let leaves: Vec<Vec<i64>> = tree
            .leaf_pages()
            .unwrap()
            .into_iter()
            .map(|p| keys(&tree, p))
            .collect();
        let flat: Vec<i64> = leaves.concat();
        assert_eq!(flat, vec![3, 5, 5, 5, 5, 5, 5, 5, 5, 5]);
        tree.validate().unwrap();
    }

    #[test]
    fn test_route_on_broken_directory() {
        let (_dir, tree) = tree(256);
        let page = tree.store.allocate(PageKind::Directory).unwrap();
        tree.store
            .append(page, &Record::internal(AttVal::Int(10), PageId::new(1)))
            .unwrap();

        let err = tree
            .route(page, &Record::Leaf(tuple(20)))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TreeCorrupted {
                operation: "insert",
                ..
            }
        ));
    }
}
