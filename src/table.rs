//! Committed counter records, keyed by `(key, level)` and ordered by position.
//!
//! The store keeps two of these: one keyed by `ListId` and one keyed by
//! `AbstractId`. Every committed counter lands in both.
//!
//! Positions within a `(key, level)` bucket live in a `BTreeMap`, so the two
//! queries the restart algorithm needs are range lookups:
//!
//! - previous sibling: the greatest position `< p`
//! - activity: does any position fall strictly between `a` and `b`
//!
//! Both are O(log k) in the number of records in the bucket.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::ops::Bound;

use rustc_hash::FxHashMap;

use crate::ids::Count;
use crate::ids::Level;
use crate::ids::Position;

#[derive(Clone, Debug)]
pub struct CounterTable<K: Copy + Eq + Hash> {
    buckets: FxHashMap<(K, Level), BTreeMap<Position, Count>>,
    len: usize,
}

impl<K: Copy + Eq + Hash> Default for CounterTable<K> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<K: Copy + Eq + Hash> CounterTable<K> {
    pub fn new() -> CounterTable<K> {
        return CounterTable {
            buckets: FxHashMap::default(),
            len: 0,
        };
    }

    /// Record a counter, replacing any previous value at the same position.
    pub fn insert(&mut self, key: K, level: Level, position: Position, count: Count) {
        let bucket = self.buckets.entry((key, level)).or_default();
        if bucket.insert(position, count).is_none() {
            self.len += 1;
        }
    }

    /// Exact lookup.
    #[inline]
    pub fn get(&self, key: K, level: Level, position: Position) -> Option<Count> {
        return self.buckets.get(&(key, level))?.get(&position).copied();
    }

    /// The record with the greatest position strictly below `position`.
    pub fn before(&self, key: K, level: Level, position: Position) -> Option<(Position, Count)> {
        let bucket = self.buckets.get(&(key, level))?;
        return bucket
            .range(..position)
            .next_back()
            .map(|(&pos, &count)| (pos, count));
    }

    /// Whether any record lies strictly between `after` and `before`.
    pub fn any_between(&self, key: K, level: Level, after: Position, before: Position) -> bool {
        if after >= before {
            return false;
        }
        let Some(bucket) = self.buckets.get(&(key, level)) else {
            return false;
        };
        return bucket
            .range((Bound::Excluded(after), Bound::Excluded(before)))
            .next()
            .is_some();
    }

    /// Every record, in no particular bucket order but ascending position
    /// within a bucket.
    pub fn iter(&self) -> impl Iterator<Item = (K, Level, Position, Count)> + '_ {
        return self.buckets.iter().flat_map(|(&(key, level), bucket)| {
            bucket.iter().map(move |(&pos, &count)| (key, level, pos, count))
        });
    }

    /// Number of committed records.
    pub fn len(&self) -> usize {
        return self.len;
    }

    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }
}
