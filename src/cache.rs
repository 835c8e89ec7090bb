//! Last-seen caches for amortizing ascending scans.
//!
//! A full rescan visits list paragraphs in document order. For each
//! `(key, level)` the only record a later paragraph can ever need as its
//! previous sibling is the most recent one, so the cache keeps just that:
//! the highest committed position and its count.
//!
//! Because every commit made while the cache is on goes through `record`,
//! an entry is always the maximum committed position for its key. That makes
//! lookups exact:
//!
//! - no entry: nothing committed, the answer is "none"
//! - entry below the query position: the entry is the answer
//! - entry at or above the query position: the cache can't say, fall back
//!
//! In an ascending scan the third case never happens, so every lookup is O(1).

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ids::Count;
use crate::ids::Level;
use crate::ids::Position;

/// The highest-position record seen for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastSeen {
    pub pos: Position,
    pub count: Count,
}

/// Result of asking the cache for the record below a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// The cache knows the answer, which may be "no record".
    Hit(Option<LastSeen>),
    /// The cache can't answer; query the table.
    Miss,
}

#[derive(Clone, Debug)]
pub struct LastSeenCache<K: Copy + Eq + Hash> {
    entries: FxHashMap<(K, Level), LastSeen>,
}

impl<K: Copy + Eq + Hash> Default for LastSeenCache<K> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<K: Copy + Eq + Hash> LastSeenCache<K> {
    pub fn new() -> LastSeenCache<K> {
        return LastSeenCache {
            entries: FxHashMap::default(),
        };
    }

    /// Note a commit. Positions below the cached one are ignored; an equal
    /// position overwrites so a re-commit stays coherent.
    #[inline]
    pub fn record(&mut self, key: K, level: Level, pos: Position, count: Count) {
        let entry = self.entries.entry((key, level)).or_insert(LastSeen { pos, count });
        if pos >= entry.pos {
            *entry = LastSeen { pos, count };
        }
    }

    #[inline]
    pub fn get(&self, key: K, level: Level) -> Option<LastSeen> {
        return self.entries.get(&(key, level)).copied();
    }

    /// The record with the greatest position strictly below `position`.
    #[inline]
    pub fn before(&self, key: K, level: Level, position: Position) -> Lookup {
        return match self.get(key, level) {
            None => Lookup::Hit(None),
            Some(seen) if seen.pos < position => Lookup::Hit(Some(seen)),
            Some(_) => Lookup::Miss,
        };
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Hit and miss counts for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    #[inline]
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    #[inline]
    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u64 {
        return self.hits + self.misses;
    }

    /// Hit rate as a percentage, 0 when nothing was looked up.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        return self.hits as f64 / total as f64 * 100.0;
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "cache: {}/{} ({:.1}% hit)", self.hits, self.total(), self.hit_rate());
    }
}
