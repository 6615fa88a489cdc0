//! Read-only views of the tree for debugging and tests.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, error};

use crate::catalog::AttVal;
use crate::common::{Error, PageId, Result};

use super::page_store::PageKind;
use super::record::Record;
use super::tree::BPlusTree;

fn corrupted(page_id: PageId, operation: &'static str, reason: String) -> Error {
    error!(page = %page_id, operation, %reason, "B+ tree corrupted");
    Error::TreeCorrupted {
        page_id: page_id.0,
        operation,
        reason,
    }
}

#[derive(Default)]
struct Walk {
    visited: HashSet<PageId>,
    leaf_depth: Option<usize>,
    prev_key: Option<AttVal>,
    records: usize,
}

impl BPlusTree {
    /// Levels from the root down to the leaves; 0 for an empty tree.
    pub fn height(&self) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }

        let limit = self.store.pool().disk_page_count() as usize;
        let mut page = self.root();
        let mut height = 1;
        while self.store.kind(page)? == PageKind::Directory {
            page = self
                .store
                .records(page)?
                .first()
                .and_then(Record::child)
                .ok_or_else(|| corrupted(page, "height", "empty directory page".into()))?;
            height += 1;
            if height > limit {
                return Err(corrupted(page, "height", "child pointers form a cycle".into()));
            }
        }
        Ok(height)
    }

    /// Number of tuples stored in the leaves.
    pub fn record_count(&self) -> Result<usize> {
        self.leaf_pages()?
            .into_iter()
            .map(|page| self.store.record_count(page))
            .sum()
    }

    /// Every leaf page, left to right.
    pub fn leaf_pages(&self) -> Result<Vec<PageId>> {
        let mut level = Vec::new();
        if !self.is_empty() {
            level.push(self.root());
        }

        loop {
            let Some(&first) = level.first() else {
                return Ok(level);
            };
            if self.store.kind(first)? == PageKind::Leaf {
                return Ok(level);
            }

            let mut next = Vec::new();
            for page in level {
                next.extend(self.store.records(page)?.iter().filter_map(Record::child));
            }
            level = next;
        }
    }

    /// Render the tree level by level.
    ///
    /// ```text
    /// Root: Page(3)
    /// Level 1: [INTERNAL 3->Page(4) 5->Page(6) MAX->Page(2)]
    /// Level 2: [LEAF 1 2 3] [LEAF 4 5] [LEAF 6 7 8 9]
    /// ```
    pub fn dump(&self) -> Result<String> {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("Root: empty\n");
            return Ok(out);
        }
        out.push_str(&format!("Root: {}\n", self.root()));

        let mut level = vec![self.root()];
        let mut depth = 1;
        while !level.is_empty() {
            out.push_str(&format!("Level {}:", depth));
            let mut next = Vec::new();
            for page in level {
                let kind = self.store.kind(page)?;
                let records = self.store.records(page)?;
                out.push_str(match kind {
                    PageKind::Leaf => " [LEAF",
                    PageKind::Directory => " [INTERNAL",
                });
                for record in &records {
                    let key = self.comparator.key_of(record);
                    let shown = if *key == self.sentinel {
                        "MAX".to_string()
                    } else {
                        key.to_string()
                    };
                    match record.child() {
                        Some(child) => {
                            out.push_str(&format!(" {}->{}", shown, child));
                            next.push(child);
                        }
                        None => {
                            out.push(' ');
                            out.push_str(&shown);
                        }
                    }
                }
                out.push(']');
            }
            out.push('\n');
            level = next;
            depth += 1;
        }
        Ok(out)
    }

    /// Walk the whole tree and check its structure.
    ///
    /// Checks that every page is sorted, every directory page ends with the
    /// sentinel, keys stay within the range their parent entry assigns, all
    /// leaves sit at the same depth and leaves ascend left to right.
    ///
    /// # Errors
    /// `Error::TreeCorrupted` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let mut walk = Walk::default();
        self.validate_page(self.root(), 1, None, None, &mut walk)?;

        debug!(
            root = %self.root(),
            pages = walk.visited.len(),
            records = walk.records,
            height = walk.leaf_depth.unwrap_or(0),
            "validated B+ tree"
        );
        Ok(())
    }

    fn validate_page(
        &self,
        page_id: PageId,
        depth: usize,
        lower: Option<&AttVal>,
        upper: Option<&AttVal>,
        walk: &mut Walk,
    ) -> Result<()> {
        if !walk.visited.insert(page_id) {
            return Err(corrupted(page_id, "validate", "page reachable twice".into()));
        }

        let mode = self.comparator.mode();
        let kind = self.store.kind(page_id)?;
        let records = self.store.records(page_id)?;

        for pair in records.windows(2) {
            if self.comparator.compare(&pair[0], &pair[1]) == Ordering::Greater {
                return Err(corrupted(
                    page_id,
                    "validate",
                    format!(
                        "key {} stored before {}",
                        self.comparator.key_of(&pair[0]),
                        self.comparator.key_of(&pair[1])
                    ),
                ));
            }
        }
        for (i, record) in records.iter().enumerate() {
            // A directory's trailing sentinel is bounded by the entries before it
            if kind == PageKind::Directory && i + 1 == records.len() {
                continue;
            }
            let key = self.comparator.key_of(record);
            let above = lower.map_or(true, |l| mode.less_or_equal(l, key));
            let below = upper.map_or(true, |u| mode.less_or_equal(key, u));
            if !(above && below) {
                return Err(corrupted(
                    page_id,
                    "validate",
                    format!("key {} outside the range of its parent entry", key),
                ));
            }
        }

        match kind {
            PageKind::Leaf => {
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(corrupted(
                            page_id,
                            "validate",
                            format!("leaf at depth {}, expected {}", depth, expected),
                        ));
                    }
                    Some(_) => {}
                }

                if let (Some(prev), Some(first)) = (&walk.prev_key, records.first()) {
                    let first = self.comparator.key_of(first);
                    if mode.less(first, prev) {
                        return Err(corrupted(
                            page_id,
                            "validate",
                            format!("leaf starts at {} below previous leaf's {}", first, prev),
                        ));
                    }
                }
                if let Some(last) = records.last() {
                    walk.prev_key = Some(self.comparator.key_of(last).clone());
                }
                walk.records += records.len();
            }
            PageKind::Directory => {
                let Some(last) = records.last() else {
                    return Err(corrupted(page_id, "validate", "empty directory page".into()));
                };
                if mode.compare(self.comparator.key_of(last), &self.sentinel) != Ordering::Equal {
                    return Err(corrupted(
                        page_id,
                        "validate",
                        "last entry is not the sentinel".into(),
                    ));
                }

                let mut child_lower = lower.cloned();
                for (i, entry) in records.iter().enumerate() {
                    let Record::Internal { key, child } = entry else {
                        continue;
                    };
                    let child_upper = if i + 1 == records.len() {
                        upper.cloned()
                    } else {
                        Some(key.clone())
                    };
                    self.validate_page(
                        *child,
                        depth + 1,
                        child_lower.as_ref(),
                        child_upper.as_ref(),
                        walk,
                    )?;
                    child_lower = Some(key.clone());
                }
            }
        }
        Ok(())
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
        let dm = DiskManager::create(dir.path().join("inspect.db")).unwrap();
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

    #[test]
    fn test_empty_tree() {
        let (_dir, tree) = tree_with(&[]);
        assert_eq!(tree.height().unwrap(), 0);
        assert_eq!(tree.record_count().unwrap(), 0);
        assert!(tree.leaf_pages().unwrap().is_empty());
        assert!(tree.validate().is_ok());
        assert_eq!(tree.dump().unwrap(), "Root: empty\n");
    }

    #[test]
    fn test_dump_layout() {
        let (_dir, tree) = tree_with(&[5, 1, 9, 3, 7, 2, 8, 4, 6]);
        let dump = tree.dump().unwrap();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Level 1: [INTERNAL 3->"));
        assert!(lines[1].contains(" MAX->"));
        assert_eq!(lines[2], "Level 2: [LEAF 1 2 3] [LEAF 4 5] [LEAF 6 7 8 9]");
    }

    #[test]
    fn test_counts_and_height() {
        let (_dir, tree) = tree_with(&[5, 1, 9, 3, 7, 2, 8, 4, 6]);
        assert_eq!(tree.height().unwrap(), 2);
        assert_eq!(tree.record_count().unwrap(), 9);
        assert_eq!(tree.leaf_pages().unwrap().len(), 3);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_deep_tree() {
        let ids: Vec<i64> = (0..200).map(|k| (k * 37) % 200).collect();
        let (_dir, tree) = tree_with(&ids);

        assert!(tree.height().unwrap() >= 4);
        assert_eq!(tree.record_count().unwrap(), 200);
        tree.validate().unwrap();
    }

    #[test]
    fn test_validate_catches_unsorted_leaf() {
        let (_dir, tree) = tree_with(&[5, 1, 9]);
        let leaf = tree.leaf_pages().unwrap()[0];
        tree.store
            .append(leaf, &Record::Leaf(Tuple::new(vec![AttVal::Int(0)])))
            .unwrap();

        assert!(matches!(
            tree.validate(),
            Err(Error::TreeCorrupted {
                operation: "validate",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_catches_missing_sentinel() {
        let (_dir, tree) = tree_with(&[1]);
        let root = tree.root();
        let leaf = tree.leaf_pages().unwrap()[0];
        tree.store.clear(root).unwrap();
        tree.store
            .append(root, &Record::internal(AttVal::Int(100), leaf))
            .unwrap();

        let err = tree.validate().unwrap_err();
        assert!(err.to_string().contains("sentinel"));
    }
}
