//! Leaf discovery for range queries.

use crate::catalog::AttVal;
use crate::common::{PageId, Result};

use super::page_store::PageKind;
use super::record::Record;
use super::tree::BPlusTree;

impl BPlusTree {
    /// Leaves that may hold keys in `[low, high]`, in key order.
    ///
    /// Empty for an empty tree or when `high < low`.
    pub fn discover(&self, low: &AttVal, high: &AttVal) -> Result<Vec<PageId>> {
        let mut out = Vec::new();
        if self.is_empty() || self.comparator.mode().less(high, low) {
            return Ok(out);
        }
        self.discover_leaves(self.root(), low, high, &mut out)?;
        Ok(out)
    }

    /// Collect into `out` the leaves under `page_id` whose key range meets
    /// `[low, high]`.
    ///
    /// A subtree is entered when `low <= entry.key`; scanning stops after
    /// the first entry with `high < entry.key`, since every later sibling
    /// only holds larger keys. Both comparisons admit equality so runs of a
    /// duplicate key that straddle a split are fully covered. Returns true
    /// if any leaf was collected.
    pub(super) fn discover_leaves(
        &self,
        page_id: PageId,
        low: &AttVal,
        high: &AttVal,
        out: &mut Vec<PageId>,
    ) -> Result<bool> {
        if self.store.kind(page_id)? == PageKind::Leaf {
            out.push(page_id);
            return Ok(true);
        }

        let mode = self.comparator.mode();
        let mut found = false;
        for entry in self.store.records(page_id)? {
            let Record::Internal { key, child } = entry else {
                continue;
            };
            if mode.less_or_equal(low, &key) {
                found |= self.discover_leaves(child, low, high, out)?;
                if mode.less(high, &key) {
                    break;
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::buffer::BufferPoolManager;
    use crate::catalog::{AttType, Schema, Table, Tuple};
    use crate::common::IndexConfig;
    use crate::storage::DiskManager;
    use tempfile::TempDir;

    fn tree_with(ids: &[i64]) -> (TempDir, BPlusTree) {
        let dir = tempfile::tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("discover.db")).unwrap();
        let pool = Arc::new(BufferPoolManager::new(16, dm));
        let schema = Schema::new().with_attribute("id", AttType::Int);
        let table = Table::create(Arc::clone(&pool), "t", schema).unwrap();
        let config = IndexConfig::default().with_page_capacity(61);
        let mut tree = BPlusTree::new("id", table, pool, config).unwrap();
        for &id in ids {
            tree.append(Tuple::new(vec![AttVal::Int(id)])).unwrap();
        }
        (dir, tree)
    }

    fn leaf_keys(tree: &BPlusTree, pages: &[PageId]) -> Vec<Vec<i64>> {
        pages
            .iter()
            .map(|&p| {
                tree.store
                    .records(p)
                    .unwrap()
                    .iter()
                    .map(|r| tree.comparator.key_of(r).to_int())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let (_dir, tree) = tree_with(&[]);
        assert!(tree
            .discover(&AttVal::Int(0), &AttVal::Int(10))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_prunes_and_stops_early() {
        // Leaves end up as [1,2,3] [4,5] [6,7,8,9]
        let (_dir, tree) = tree_with(&[5, 1, 9, 3, 7, 2, 8, 4, 6]);

        let pages = tree.discover(&AttVal::Int(1), &AttVal::Int(2)).unwrap();
        assert_eq!(leaf_keys(&tree, &pages), vec![vec![1, 2, 3]]);

        // A 5 could also sit right of the separator 5
        let pages = tree.discover(&AttVal::Int(4), &AttVal::Int(5)).unwrap();
        assert_eq!(leaf_keys(&tree, &pages), vec![vec![4, 5], vec![6, 7, 8, 9]]);

        let pages = tree.discover(&AttVal::Int(3), &AttVal::Int(7)).unwrap();
        assert_eq!(
            leaf_keys(&tree, &pages),
            vec![vec![1, 2, 3], vec![4, 5], vec![6, 7, 8, 9]]
        );
    }

    #[test]
    fn test_inverted_bounds() {
        let (_dir, tree) = tree_with(&[1, 2, 3]);
        assert!(tree
            .discover(&AttVal::Int(3), &AttVal::Int(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicates_across_split() {
        let (_dir, tree) = tree_with(&[7, 7, 7, 7, 7, 7]);
        let pages = tree.discover(&AttVal::Int(7), &AttVal::Int(7)).unwrap();
        let total: usize = leaf_keys(&tree, &pages).iter().map(Vec::len).sum();
        assert_eq!(total, 6);
    }
}
