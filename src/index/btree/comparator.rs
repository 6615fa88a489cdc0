//! Key comparison for the ordering attribute.
//!
//! [`OrderingMode`] compares two already-resolved key values. It is picked
//! once from the ordering attribute's type by promotion capability: int,
//! then double, then string. [`KeyComparator`] resolves records to their
//! keys (an internal record's key, or the leaf tuple's ordering attribute)
//! and builds predicates over them.

use std::cmp::Ordering;

use crate::catalog::{AttType, AttVal, Tuple};

use super::record::Record;

/// Comparison domain of the ordering attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMode {
    Int,
    Double,
    Text,
}

impl OrderingMode {
    /// Pick the domain for `att_type`, or None if it cannot be ordered.
    pub fn for_type(att_type: AttType) -> Option<Self> {
        if att_type.promotable_to_int() {
            Some(OrderingMode::Int)
        } else if att_type.promotable_to_double() {
            Some(OrderingMode::Double)
        } else if att_type.promotable_to_string() {
            Some(OrderingMode::Text)
        } else {
            None
        }
    }

    /// Total order over keys. Doubles use IEEE 754 `totalOrder` with the
    /// two zeros treated as one key.
    pub fn compare(self, lhs: &AttVal, rhs: &AttVal) -> Ordering {
        match self {
            OrderingMode::Int => lhs.to_int().cmp(&rhs.to_int()),
            OrderingMode::Double => {
                unsigned_zero(lhs.to_double()).total_cmp(&unsigned_zero(rhs.to_double()))
            }
            OrderingMode::Text => lhs.to_text().cmp(&rhs.to_text()),
        }
    }

    #[inline]
    pub fn less(self, lhs: &AttVal, rhs: &AttVal) -> bool {
        self.compare(lhs, rhs) == Ordering::Less
    }

    #[inline]
    pub fn less_or_equal(self, lhs: &AttVal, rhs: &AttVal) -> bool {
        self.compare(lhs, rhs) != Ordering::Greater
    }
}

/// Map -0.0 to 0.0, leaving every other value (NaN included) untouched.
#[inline]
fn unsigned_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Orders leaf and internal records by key.
///
/// Leaf tuples reaching the comparator have been validated against the
/// table schema, so the ordering attribute is always present.
#[derive(Debug, Clone, Copy)]
pub struct KeyComparator {
    mode: OrderingMode,
    ordering_att: usize,
}

impl KeyComparator {
    pub fn new(mode: OrderingMode, ordering_att: usize) -> Self {
        Self { mode, ordering_att }
    }

    pub fn mode(&self) -> OrderingMode {
        self.mode
    }

    /// Key of a tuple: its ordering attribute.
    #[inline]
    pub fn tuple_key<'a>(&self, tuple: &'a Tuple) -> &'a AttVal {
        &tuple.values()[self.ordering_att]
    }

    /// Key of any record.
    #[inline]
    pub fn key_of<'a>(&self, record: &'a Record) -> &'a AttVal {
        match record {
            Record::Internal { key, .. } => key,
            Record::Leaf(tuple) => self.tuple_key(tuple),
        }
    }

    pub fn compare(&self, lhs: &Record, rhs: &Record) -> Ordering {
        self.mode.compare(self.key_of(lhs), self.key_of(rhs))
    }

    /// Predicate `key(lhs) < key(rhs)`.
    ///
    /// The closure owns copies of both keys, so it stays valid after the
    /// records or the pages they came from change.
    pub fn build_less(&self, lhs: &Record, rhs: &Record) -> impl Fn() -> bool {
        let (mode, l, r) = self.resolve(lhs, rhs);
        move || mode.less(&l, &r)
    }

    /// Predicate `key(lhs) <= key(rhs)`, with the same ownership as
    /// [`build_less`](Self::build_less).
    pub fn build_less_or_equal(&self, lhs: &Record, rhs: &Record) -> impl Fn() -> bool {
        let (mode, l, r) = self.resolve(lhs, rhs);
        move || mode.less_or_equal(&l, &r)
    }

    fn resolve(&self, lhs: &Record, rhs: &Record) -> (OrderingMode, AttVal, AttVal) {
        (
            self.mode,
            self.key_of(lhs).clone(),
            self.key_of(rhs).clone(),
        )
    }
}
