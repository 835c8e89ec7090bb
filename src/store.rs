//! Counter and path store for one document session.
//!
//! The store owns every piece of numbering state for a document snapshot:
//!
//! 1. **Level configuration**: start value, restart policy, and override flag
//!    for each `(ListId, Level)`.
//!
//! 2. **Two counter tables**: every committed counter is written under its
//!    `ListId` and mirrored under its `AbstractId`. Levels that are not
//!    overridden look up previous siblings in the abstract table, so lists
//!    that copy one abstract definition keep counting as one sequence. An
//!    overridden level looks in the list table and counts on its own.
//!
//! 3. **Caches** (only while cache mode is on): the highest committed record
//!    per key, and memoized ancestor paths. These never change a result,
//!    only its cost. See `cache` for why the lookups stay exact.
//!
//! `calculate_counter` only proposes a value; nothing is committed until the
//! caller passes it to `set_counter`. Toggling cache mode or calling `clear`
//! throws all state away, so a store is rebuilt from scratch on every rescan.
//!
//! # Restart rule
//!
//! A level continues from its previous sibling (`previous + 1`) unless a
//! sufficiently shallow level was used since that sibling, in which case it
//! falls back to its start value. `Restart` decides what "sufficiently
//! shallow" means. A level with no previous sibling starts at its start value.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cache::CacheStats;
use crate::cache::LastSeen;
use crate::cache::LastSeenCache;
use crate::cache::Lookup;
use crate::config::ListLevelConfig;
use crate::config::Restart;
use crate::ids::AbstractId;
use crate::ids::Count;
use crate::ids::Level;
use crate::ids::ListId;
use crate::ids::Position;
use crate::table::CounterTable;

/// Counters from the outermost level down to some level. Word stops at nine
/// levels, so paths stay inline.
pub type Path = SmallVec<[Count; 9]>;

type UsedLevels = SmallVec<[Level; 9]>;

/// One committed counter, as exposed for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CounterRecord {
    pub list: ListId,
    pub level: Level,
    pub position: Position,
    pub count: Count,
}

#[derive(Clone, Debug, Default)]
pub struct CounterStore {
    configs: FxHashMap<(ListId, Level), ListLevelConfig>,
    by_list: CounterTable<ListId>,
    by_abstract: CounterTable<AbstractId>,
    abstract_of: FxHashMap<ListId, AbstractId>,
    cache_enabled: bool,
    last_by_list: LastSeenCache<ListId>,
    last_by_abstract: LastSeenCache<AbstractId>,
    paths: FxHashMap<(ListId, Level, Position), Path>,
    stats: CacheStats,
    path_stats: CacheStats,
}

impl CounterStore {
    /// Create an empty store with cache mode off.
    pub fn new() -> CounterStore {
        return CounterStore::default();
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Record the configuration of one level. Last write wins.
    pub fn set_start_settings(&mut self, list: ListId, level: Level, config: ListLevelConfig) {
        self.configs.insert((list, level), config);
    }

    /// The configuration of one level, or the default if none was recorded.
    pub fn config(&self, list: ListId, level: Level) -> ListLevelConfig {
        return self.configs.get(&(list, level)).copied().unwrap_or_default();
    }

    /// The abstract definition `list` was last committed or calculated under.
    pub fn abstract_id(&self, list: ListId) -> Option<AbstractId> {
        return self.abstract_of.get(&list).copied();
    }

    // =========================================================================
    // Committed counters
    // =========================================================================

    /// Commit a counter under both its list and its abstract definition.
    ///
    /// In cache mode, positions for one `(list, level)` must be committed in
    /// ascending order.
    pub fn set_counter(&mut self, list: ListId, level: Level, position: Position, count: Count, abstract_id: AbstractId) {
        self.by_list.insert(list, level, position, count);
        self.by_abstract.insert(abstract_id, level, position, count);
        self.abstract_of.insert(list, abstract_id);

        if self.cache_enabled {
            debug_assert!(
                self.last_by_list.get(list, level).is_none_or(|seen| position >= seen.pos),
                "{list} level {level}: position {position} committed out of order",
            );
            self.last_by_list.record(list, level, position, count);
            self.last_by_abstract.record(abstract_id, level, position, count);
        }
    }

    /// Exact lookup of a committed counter.
    pub fn get_counter(&self, list: ListId, level: Level, position: Position) -> Option<Count> {
        return self.by_list.get(list, level, position);
    }

    /// Every committed counter, sorted by list, level, then position.
    ///
    /// For tests and diagnostics.
    pub fn counters(&self) -> Vec<CounterRecord> {
        let mut records: Vec<CounterRecord> = self
            .by_list
            .iter()
            .map(|(list, level, position, count)| CounterRecord { list, level, position, count })
            .collect();
        records.sort_unstable();
        return records;
    }

    /// Number of committed counters.
    pub fn len(&self) -> usize {
        return self.by_list.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.by_list.is_empty();
    }

    // =========================================================================
    // Restart algorithm
    // =========================================================================

    /// Propose the counter for a list paragraph. Commits nothing.
    ///
    /// The only state this touches is the `list -> abstract` association,
    /// which later path lookups rely on.
    pub fn calculate_counter(&mut self, list: ListId, level: Level, position: Position, abstract_id: AbstractId) -> Count {
        self.abstract_of.insert(list, abstract_id);
        let config = self.config(list, level);

        let previous = self.previous_sibling(list, level, position, abstract_id, config.start_overridden);
        let Some(previous) = previous else {
            return config.start;
        };

        if config.restart == Restart::Never {
            return previous.count.saturating_add(1);
        }

        let used = self.used_levels(abstract_id, level, previous.pos, position);
        if config.restart.fires(&used) {
            tracing::trace!(
                list = list.0,
                level,
                position,
                previous = previous.pos,
                ?used,
                start = config.start,
                "restart"
            );
            return config.start;
        }

        return previous.count.saturating_add(1);
    }

    /// The previous sibling in the table the level's override flag selects.
    fn previous_sibling(
        &mut self,
        list: ListId,
        level: Level,
        position: Position,
        abstract_id: AbstractId,
        overridden: bool,
    ) -> Option<LastSeen> {
        if self.cache_enabled {
            let lookup = if overridden {
                self.last_by_list.before(list, level, position)
            } else {
                self.last_by_abstract.before(abstract_id, level, position)
            };
            if let Lookup::Hit(seen) = lookup {
                self.stats.hit();
                return seen;
            }
            self.stats.miss();
        }

        let found = if overridden {
            self.by_list.before(list, level, position)
        } else {
            self.by_abstract.before(abstract_id, level, position)
        };
        return found.map(|(pos, count)| LastSeen { pos, count });
    }

    /// Levels shallower than `level` with a record strictly between `after`
    /// and `before`, under `abstract_id`.
    fn used_levels(&mut self, abstract_id: AbstractId, level: Level, after: Position, before: Position) -> UsedLevels {
        let mut used = UsedLevels::new();
        for shallower in 0..level {
            if self.was_used(abstract_id, shallower, after, before) {
                used.push(shallower);
            }
        }
        return used;
    }

    fn was_used(&mut self, abstract_id: AbstractId, level: Level, after: Position, before: Position) -> bool {
        if self.cache_enabled {
            if let Lookup::Hit(seen) = self.last_by_abstract.before(abstract_id, level, before) {
                self.stats.hit();
                return seen.is_some_and(|seen| seen.pos > after);
            }
            self.stats.miss();
        }
        return self.by_abstract.any_between(abstract_id, level, after, before);
    }

    // =========================================================================
    // Paths
    // =========================================================================

    /// Counters of every level above `level` in effect at `position`.
    ///
    /// Each ancestor level takes the counter committed at the greatest
    /// position below `position` under the list's abstract definition, or
    /// its start value if there is none. The result has `level` entries.
    pub fn ancestors_path(&mut self, list: ListId, level: Level, position: Position) -> Path {
        if self.cache_enabled {
            if let Some(path) = self.paths.get(&(list, level, position)) {
                self.path_stats.hit();
                return path.clone();
            }
            self.path_stats.miss();
        }

        let abstract_id = self.abstract_id(list);
        let mut path = Path::new();
        for ancestor in 0..level {
            let found = match abstract_id {
                Some(abstract_id) => self.ancestor_before(abstract_id, ancestor, position),
                None => None,
            };
            let count = match found {
                Some(seen) => seen.count,
                None => self.config(list, ancestor).start,
            };
            path.push(count);
        }

        if self.cache_enabled {
            self.paths.insert((list, level, position), path.clone());
        }
        return path;
    }

    fn ancestor_before(&mut self, abstract_id: AbstractId, level: Level, position: Position) -> Option<LastSeen> {
        if self.cache_enabled {
            if let Lookup::Hit(seen) = self.last_by_abstract.before(abstract_id, level, position) {
                self.stats.hit();
                return seen;
            }
            self.stats.miss();
        }
        return self
            .by_abstract
            .before(abstract_id, level, position)
            .map(|(pos, count)| LastSeen { pos, count });
    }

    /// The ancestor path with the level's own committed counter appended.
    ///
    /// `None` if the counter at `(list, level, position)` was never committed.
    pub fn calculate_path(&mut self, list: ListId, level: Level, position: Position) -> Option<Path> {
        let count = self.get_counter(list, level, position)?;
        let mut path = self.ancestors_path(list, level, position);
        path.push(count);
        return Some(path);
    }

    // =========================================================================
    // Cache mode
    // =========================================================================

    /// Throw away all state and turn cache mode on.
    ///
    /// Positions must then be visited in ascending order until the cache is
    /// disabled again.
    pub fn enable_cache(&mut self) {
        self.reset();
        self.cache_enabled = true;
        tracing::debug!("numbering cache enabled");
    }

    /// Throw away all state and turn cache mode off.
    pub fn disable_cache(&mut self) {
        self.reset();
        self.cache_enabled = false;
        tracing::debug!("numbering cache disabled");
    }

    /// Throw away all state, keeping the current cache mode.
    pub fn clear(&mut self) {
        self.reset();
    }

    pub fn is_cache_enabled(&self) -> bool {
        return self.cache_enabled;
    }

    /// Last-seen cache hits and misses since the last reset.
    pub fn stats(&self) -> CacheStats {
        return self.stats;
    }

    /// Ancestor-path memo hits and misses since the last reset.
    pub fn path_stats(&self) -> CacheStats {
        return self.path_stats;
    }

    fn reset(&mut self) {
        self.configs.clear();
        self.by_list.clear();
        self.by_abstract.clear();
        self.abstract_of.clear();
        self.last_by_list.clear();
        self.last_by_abstract.clear();
        self.paths.clear();
        self.stats = CacheStats::default();
        self.path_stats = CacheStats::default();
    }
}
