//! Property-based tests for the counter store.

use numbering::config::ListLevelConfig;
use numbering::config::Restart;
use numbering::ids::AbstractId;
use numbering::ids::Count;
use numbering::ids::Level;
use numbering::ids::ListId;
use numbering::ids::Position;
use numbering::store::CounterStore;
use proptest::prelude::*;

// =============================================================================
// Test helpers
// =============================================================================

const LISTS: u32 = 3;
const LEVELS: Level = 4;

/// Lists 0 and 1 copy one abstract definition; list 2 has its own.
fn abstract_of(list: ListId) -> AbstractId {
    return if list.0 < 2 { AbstractId(0) } else { AbstractId(1) };
}

/// One list paragraph: gap since the previous position, list, level.
#[derive(Clone, Debug)]
struct Item {
    gap: u64,
    list: ListId,
    level: Level,
}

fn arbitrary_item() -> impl Strategy<Value = Item> {
    return (1u64..4, 0..LISTS, 0..LEVELS).prop_map(|(gap, list, level)| Item {
        gap,
        list: ListId(list),
        level,
    });
}

fn arbitrary_restart() -> impl Strategy<Value = Restart> {
    return prop_oneof![
        Just(None::<u32>),
        Just(Some(0u32)),
        (1u32..LEVELS as u32).prop_map(Some),
    ]
    .prop_map(Restart::from_raw);
}

fn arbitrary_config() -> impl Strategy<Value = ListLevelConfig> {
    return (1u32..5, arbitrary_restart(), any::<bool>()).prop_map(|(start, restart, start_overridden)| {
        ListLevelConfig { start, restart, start_overridden }
    });
}

/// A configuration for every `(list, level)`.
fn arbitrary_configs() -> impl Strategy<Value = Vec<ListLevelConfig>> {
    return prop::collection::vec(arbitrary_config(), (LISTS as usize) * (LEVELS as usize));
}

fn seed(store: &mut CounterStore, configs: &[ListLevelConfig]) {
    for list in 0..LISTS {
        for level in 0..LEVELS {
            let config = configs[(list as usize) * (LEVELS as usize) + level as usize];
            store.set_start_settings(ListId(list), level, config);
        }
    }
}

/// Scan items in ascending order, returning each counter and path.
fn scan(store: &mut CounterStore, configs: &[ListLevelConfig], items: &[Item]) -> Vec<(Count, Vec<Count>)> {
    seed(store, configs);
    let mut results = Vec::with_capacity(items.len());
    let mut position: Position = 0;
    for item in items {
        position += item.gap;
        let abstract_id = abstract_of(item.list);
        let count = store.calculate_counter(item.list, item.level, position, abstract_id);
        store.set_counter(item.list, item.level, position, count, abstract_id);
        let path = store.calculate_path(item.list, item.level, position).expect("committed");
        results.push((count, path.to_vec()));
    }
    return results;
}

/// Straightforward restart rule over a single list's history.
fn expected_count(history: &[(Position, Level, Count)], level: Level, position: Position, config: ListLevelConfig) -> Count {
    let previous = history.iter().rev().find(|(_, l, _)| *l == level);
    let Some(&(previous_pos, _, previous_count)) = previous else {
        return config.start;
    };
    let used: Vec<Level> = history
        .iter()
        .filter(|(pos, l, _)| *l < level && *pos > previous_pos && *pos < position)
        .map(|(_, l, _)| *l)
        .collect();
    let restart = match config.restart.to_raw() {
        None => !used.is_empty(),
        Some(0) => false,
        Some(r) => used.iter().any(|&l| l as u32 <= r),
    };
    return if restart { config.start } else { previous_count + 1 };
}

// =============================================================================
// Cache equivalence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// An ascending scan gives identical counters and paths with and without the cache.
    #[test]
    fn cache_mode_matches_history_scan(
        configs in arbitrary_configs(),
        items in prop::collection::vec(arbitrary_item(), 1..80),
    ) {
        let mut plain = CounterStore::new();
        let expected = scan(&mut plain, &configs, &items);

        let mut cached = CounterStore::new();
        cached.enable_cache();
        let actual = scan(&mut cached, &configs, &items);

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(cached.counters(), plain.counters());
        prop_assert_eq!(cached.stats().misses, 0);
    }

    /// Every path is the ancestors followed by the committed counter.
    #[test]
    fn path_is_ancestors_then_counter(
        configs in arbitrary_configs(),
        items in prop::collection::vec(arbitrary_item(), 1..60),
        cache in any::<bool>(),
    ) {
        let mut store = CounterStore::new();
        if cache {
            store.enable_cache();
        }
        seed(&mut store, &configs);
        let mut position: Position = 0;
        for item in &items {
            position += item.gap;
            let abstract_id = abstract_of(item.list);
            let count = store.calculate_counter(item.list, item.level, position, abstract_id);
            store.set_counter(item.list, item.level, position, count, abstract_id);

            let mut expected = store.ancestors_path(item.list, item.level, position).to_vec();
            expected.push(store.get_counter(item.list, item.level, position).unwrap());
            let path = store.calculate_path(item.list, item.level, position).unwrap();
            prop_assert_eq!(path.len(), item.level as usize + 1);
            prop_assert_eq!(path.to_vec(), expected);
        }
    }
}

// =============================================================================
// Restart rules
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A single list follows the plain restart rule for any configuration.
    #[test]
    fn single_list_matches_restart_rule(
        configs in prop::collection::vec(arbitrary_config(), LEVELS as usize),
        levels in prop::collection::vec(0..LEVELS, 1..80),
        cache in any::<bool>(),
    ) {
        let list = ListId(0);
        let abstract_id = AbstractId(0);
        let mut store = CounterStore::new();
        if cache {
            store.enable_cache();
        }
        for (level, config) in configs.iter().enumerate() {
            store.set_start_settings(list, level as Level, *config);
        }

        let mut history: Vec<(Position, Level, Count)> = Vec::new();
        for (i, &level) in levels.iter().enumerate() {
            let position = i as Position;
            let expected = expected_count(&history, level, position, configs[level as usize]);
            let count = store.calculate_counter(list, level, position, abstract_id);
            prop_assert_eq!(count, expected);
            store.set_counter(list, level, position, count, abstract_id);
            history.push((position, level, count));
        }
    }

    /// With no shallower activity, a level counts up by one from its start.
    #[test]
    fn monotonic_continuation(
        start in 1u32..10,
        level in 0..LEVELS,
        gaps in prop::collection::vec(1u64..10, 1..50),
    ) {
        let mut store = CounterStore::new();
        store.set_start_settings(ListId(0), level, ListLevelConfig::new(start, Restart::AnyShallower));
        let mut position = 0;
        for (i, gap) in gaps.iter().enumerate() {
            position += gap;
            let count = store.calculate_counter(ListId(0), level, position, AbstractId(0));
            prop_assert_eq!(count, start + i as Count);
            store.set_counter(ListId(0), level, position, count, AbstractId(0));
        }
    }

    /// A level that never restarts counts up by one whatever happens above it.
    #[test]
    fn restart_zero_never_resets(
        levels in prop::collection::vec(0..LEVELS, 1..80),
    ) {
        let mut store = CounterStore::new();
        store.enable_cache();
        for level in 0..LEVELS {
            store.set_start_settings(ListId(0), level, ListLevelConfig::new(1, Restart::from_raw(Some(0))));
        }
        let mut seen = [0 as Count; LEVELS as usize];
        for (i, &level) in levels.iter().enumerate() {
            let count = store.calculate_counter(ListId(0), level, i as Position, AbstractId(0));
            seen[level as usize] += 1;
            prop_assert_eq!(count, seen[level as usize]);
            store.set_counter(ListId(0), level, i as Position, count, AbstractId(0));
        }
    }
}
