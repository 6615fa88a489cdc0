//! Iterators over discovered leaf pages.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::catalog::{AttVal, Tuple};
use crate::common::{PageId, Result};

use super::comparator::{KeyComparator, OrderingMode};
use super::page_store::PageStore;
use super::record::Record;

/// Tuples of a list of leaf pages, page by page, as stored.
///
/// Pages are read lazily, one at a time. A page that cannot be read yields
/// one `Err` and the iterator moves on to the next page.
pub struct PageListIter {
    store: PageStore,
    pages: std::vec::IntoIter<PageId>,
    current: std::vec::IntoIter<Record>,
}

impl PageListIter {
    pub fn new(store: PageStore, pages: Vec<PageId>) -> Self {
        Self {
            store,
            pages: pages.into_iter(),
            current: Vec::new().into_iter(),
        }
    }

    /// Pages not visited yet.
    pub fn remaining_pages(&self) -> &[PageId] {
        self.pages.as_slice()
    }
}

impl Iterator for PageListIter {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tuple) = self.current.by_ref().find_map(Record::into_tuple) {
                return Some(Ok(tuple));
            }

            let page_id = self.pages.next()?;
            match self.store.records(page_id) {
                Ok(records) => self.current = records.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Head of one page's run in the merge heap.
struct Head {
    mode: OrderingMode,
    key: AttVal,
    run: usize,
    tuple: Tuple,
}

// BinaryHeap is a max-heap: reverse so the smallest key (then the lowest
// run, keeping equal keys in page order) comes out first.
impl Ord for Head {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mode
            .compare(&other.key, &self.key)
            .then_with(|| other.run.cmp(&self.run))
    }
}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

/// Tuples with keys in `[low, high]`, ascending across all pages.
///
/// Each page is read once up front, filtered to the bounds and sorted;
/// the runs are then merged through a min-heap of their heads.
pub struct SortedRangeIter {
    comparator: KeyComparator,
    runs: Vec<std::vec::IntoIter<Tuple>>,
    heap: BinaryHeap<Head>,
}

impl SortedRangeIter {
    pub fn new(
        store: &PageStore,
        pages: &[PageId],
        low: &AttVal,
        high: &AttVal,
        comparator: KeyComparator,
    ) -> Result<Self> {
        let mode = comparator.mode();
        let mut iter = Self {
            comparator,
            runs: Vec::with_capacity(pages.len()),
            heap: BinaryHeap::with_capacity(pages.len()),
        };

        for &page_id in pages {
            let mut tuples: Vec<Tuple> = store
                .records(page_id)?
                .into_iter()
                .filter_map(Record::into_tuple)
                .filter(|t| {
                    let key = comparator.tuple_key(t);
                    mode.less_or_equal(low, key) && mode.less_or_equal(key, high)
                })
                .collect();
            tuples.sort_by(|a, b| mode.compare(comparator.tuple_key(a), comparator.tuple_key(b)));

            iter.runs.push(tuples.into_iter());
            iter.advance(iter.runs.len() - 1);
        }
        Ok(iter)
    }

    /// Push the next tuple of `run`, if any, onto the heap.
    fn advance(&mut self, run: usize) {
        if let Some(tuple) = self.runs[run].next() {
            self.heap.push(Head {
                mode: self.comparator.mode(),
                key: self.comparator.tuple_key(&tuple).clone(),
                run,
                tuple,
            });
        }
    }
}

impl Iterator for SortedRangeIter {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        let head = self.heap.pop()?;
        self.advance(head.run);
        Some(head.tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.heap.len() + self.runs.iter().map(|r| r.len()).sum::<usize>();
        (len, Some(len))
    }
}
