//! Page splitting.

use tracing::debug;

use crate::common::{Error, PageId, Result};

use super::page_store::PageStore;
use super::record::Record;
use super::tree::BPlusTree;

impl BPlusTree {
    /// Split a full page that rejected `extra`.
    ///
    /// `extra` joins the page's records at `slot`, or after every record
    /// with an equal or smaller key when `slot` is None. The combined,
    /// key-sorted list is cut at `count / 2`. The lower half moves to a new
    /// page of the same kind, the upper half stays on `page_id`. Returns the
    /// separator to insert into the parent: the lower half's largest key,
    /// pointing at the new page.
    ///
    /// A directory's lower half gets its last entry re-keyed to the sentinel
    /// once that key has been promoted, so every directory page still ends
    /// in a sentinel entry.
    pub(super) fn split(
        &self,
        page_id: PageId,
        extra: Record,
        slot: Option<usize>,
    ) -> Result<Record> {
        let kind = self.store.kind(page_id)?;

        let mut records = self.store.records(page_id)?;
        let slot = slot.unwrap_or_else(|| {
            records.partition_point(|r| self.comparator.compare(r, &extra).is_le())
        });
        records.insert(slot.min(records.len()), extra);
        records.sort_by(|a, b| self.comparator.compare(a, b));

        let mid = split_point(&self.store, &records)
            .ok_or(Error::SplitOverflow { page_id: page_id.0 })?;
        let upper = records.split_off(mid);
        let mut lower = records;

        let promoted_key = match lower.last_mut() {
            Some(last) => {
                let key = self.comparator.key_of(last).clone();
                if let Record::Internal { key: last_key, .. } = last {
                    *last_key = self.sentinel.clone();
                }
                key
            }
            None => return Err(Error::SplitOverflow { page_id: page_id.0 }),
        };

        let new_page = self.store.allocate(kind)?;
        self.fill(new_page, &lower)?;
        self.store.clear(page_id)?;
        self.fill(page_id, &upper)?;

        debug!(
            page = %page_id,
            new_page = %new_page,
            kind = ?kind,
            lower = lower.len(),
            upper = upper.len(),
            promoted = %promoted_key,
            "split page"
        );

        Ok(Record::internal(promoted_key, new_page))
    }

    fn fill(&self, page_id: PageId, records: &[Record]) -> Result<()> {
        for record in records {
            if !self.store.append(page_id, record)? {
                return Err(Error::SplitOverflow { page_id: page_id.0 });
            }
        }
        Ok(())
    }
}

/// Where to cut `records`: `len / 2` when both halves fit, otherwise the
/// nearest cut that does. None if no cut leaves both halves non-empty and
/// within capacity.
fn split_point(store: &PageStore, records: &[Record]) -> Option<usize> {
    let n = records.len();
    if n < 2 {
        return None;
    }
    let fits = |mid: usize| store.fits(&records[..mid]) && store.fits(&records[mid..]);

    let mid = n / 2;
    (0..n)
        .flat_map(|delta| [mid.checked_sub(delta), mid.checked_add(delta)])
        .flatten()
        .filter(|&cut| cut >= 1 && cut < n)
        .find(|&cut| fits(cut))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::buffer::BufferPoolManager;
    use crate::catalog::{AttType, AttVal, Schema, Table, Tuple};
    use crate::common::IndexConfig;
    use crate::index::btree::page_store::PageKind;
    use crate::storage::DiskManager;
    use tempfile::TempDir;

    fn tree(capacity: usize) -> (TempDir, BPlusTree) {
        let dir = tempfile::tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("split.db")).unwrap();
        let pool = Arc::new(BufferPoolManager::new(16, dm));
        let schema = Schema::new().with_attribute("id", AttType::Int);
        let table = Table::create(Arc::clone(&pool), "t", schema).unwrap();
        let config = IndexConfig::default().with_page_capacity(capacity);
        (dir, BPlusTree::new("id", table, pool, config).unwrap())
    }

    fn row(id: i64) -> Record {
        Record::Leaf(Tuple::new(vec![AttVal::Int(id)]))
    }

    fn kinds(store: &PageStore, pages: &[PageId]) -> Vec<PageKind> {
        pages.iter().map(|&p| store.kind(p).unwrap()).collect()
    }

    #[test]
    fn test_leaf_split_balance() {
        let (_dir, tree) = tree(61);
        let leaf = tree.store.allocate(PageKind::Leaf).unwrap();
        for id in [40, 10, 30, 20] {
            assert!(tree.store.append(leaf, &row(id)).unwrap());
        }

        let promoted = tree.split(leaf, row(25), None).unwrap();
        let new_page = promoted.child().unwrap();

        // 5 records: 2 move to the new page, 3 stay
        assert_eq!(tree.comparator.key_of(&promoted), &AttVal::Int(20));
        assert_eq!(tree.store.records(new_page).unwrap(), vec![row(10), row(20)]);
        assert_eq!(
            tree.store.records(leaf).unwrap(),
            vec![row(25), row(30), row(40)]
        );
        assert_eq!(
            kinds(&tree.store, &[leaf, new_page]),
            vec![PageKind::Leaf, PageKind::Leaf]
        );
    }

    #[test]
    fn test_directory_split_keeps_sentinel() {
        let (_dir, tree) = tree(61);
        let page = tree.store.allocate(PageKind::Directory).unwrap();
        let entries = [
            Record::internal(AttVal::Int(10), PageId::new(100)),
            Record::internal(AttVal::Int(20), PageId::new(101)),
            Record::internal(AttVal::Int(i64::MAX), PageId::new(102)),
        ];
        for entry in &entries {
            assert!(tree.store.append(page, entry).unwrap());
        }

        let promoted = tree
            .split(page, Record::internal(AttVal::Int(15), PageId::new(103)), Some(1))
            .unwrap();
        let lower = tree.store.records(promoted.child().unwrap()).unwrap();
        let upper = tree.store.records(page).unwrap();

        assert_eq!(tree.comparator.key_of(&promoted), &AttVal::Int(15));
        assert_eq!(
            lower,
            vec![
                Record::internal(AttVal::Int(10), PageId::new(100)),
                Record::internal(AttVal::Int(i64::MAX), PageId::new(103)),
            ]
        );
        assert_eq!(upper, entries[1..].to_vec());
    }

    #[test]
    fn test_split_point_shifts_for_uneven_records() {
        let dir = tempfile::tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("sp.db")).unwrap();
        let pool = Arc::new(BufferPoolManager::new(4, dm));
        let schema = Arc::new(Schema::new().with_attribute("name", AttType::String));
        let store = PageStore::new(pool, schema, 60);

        let text = |s: &str| Record::Leaf(Tuple::new(vec![s.into()]));
        // Slots of 7, 7, 7 and 50 bytes: only a cut at 3 fits in 60
        let records = vec![text(""), text(""), text(""), text(&"x".repeat(43))];
        assert_eq!(split_point(&store, &records), Some(3));

        assert_eq!(split_point(&store, &records[..1]), None);
    }
}
