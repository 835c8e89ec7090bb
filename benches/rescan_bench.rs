// Full-rescan benchmark - cache mode against historical queries.
//
// Builds an outline document of N list paragraphs spread over a few lists
// and levels, then numbers it:
// - cached: one `rescan` pass, O(1) lookups per paragraph
// - historical: the same calls with cache mode off, ordered-table lookups

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use numbering::config::Definitions;
use numbering::config::ListLevelConfig;
use numbering::config::Restart;
use numbering::ids::AbstractId;
use numbering::ids::Level;
use numbering::ids::ListId;
use numbering::scan::Paragraph;
use numbering::scan::Rendered;
use numbering::scan::rescan;
use numbering::store::CounterStore;

const LISTS: u32 = 4;
const LEVELS: Level = 5;

fn definitions() -> Definitions {
    let mut definitions = Definitions::new();
    for list in 0..LISTS {
        for level in 0..LEVELS {
            let restart = match level {
                3 => Restart::from_raw(Some(1)),
                4 => Restart::Never,
                _ => Restart::AnyShallower,
            };
            definitions.insert(ListId(list), AbstractId(list / 2), level, ListLevelConfig::new(1, restart));
        }
    }
    return definitions;
}

// Deterministic outline walk: mostly siblings, with regular dives and climbs.
fn document(len: u64) -> Vec<Paragraph> {
    let mut paragraphs = Vec::with_capacity(len as usize);
    let mut level: Level = 0;
    for position in 0..len {
        level = match position % 7 {
            0 => 0,
            1 | 4 => (level + 1).min(LEVELS - 1),
            5 => level.saturating_sub(2),
            _ => level,
        };
        if position % 11 == 10 {
            paragraphs.push(Paragraph::plain(position));
            continue;
        }
        let list = ListId(((position / 97) % LISTS as u64) as u32);
        paragraphs.push(Paragraph::numbered(position, list, level));
    }
    return paragraphs;
}

fn historical(store: &mut CounterStore, definitions: &Definitions, paragraphs: &[Paragraph]) {
    store.disable_cache();
    for (list, level, definition) in definitions.iter() {
        store.set_start_settings(list, level, definition.config);
    }
    for paragraph in paragraphs {
        let Some(numbering) = paragraph.numbering else {
            continue;
        };
        let Some(definition) = definitions.level(numbering.list, numbering.level) else {
            continue;
        };
        let count = store.calculate_counter(numbering.list, numbering.level, paragraph.position, definition.abstract_id);
        store.set_counter(numbering.list, numbering.level, paragraph.position, count, definition.abstract_id);
        black_box(store.calculate_path(numbering.list, numbering.level, paragraph.position));
    }
}

fn bench_rescan(c: &mut Criterion) {
    let definitions = definitions();
    let mut group = c.benchmark_group("rescan");

    for len in [1_000u64, 10_000, 50_000] {
        let paragraphs = document(len);
        group.throughput(Throughput::Elements(len));

        group.bench_with_input(BenchmarkId::new("cached", len), &paragraphs, |b, paragraphs| {
            let mut store = CounterStore::new();
            let mut rendered: Vec<Rendered> = Vec::with_capacity(paragraphs.len());
            b.iter(|| {
                rendered.clear();
                let summary = rescan(&mut store, &definitions, paragraphs.iter().copied(), &mut rendered);
                black_box(summary.is_ok())
            });
        });

        group.bench_with_input(BenchmarkId::new("historical", len), &paragraphs, |b, paragraphs| {
            let mut store = CounterStore::new();
            b.iter(|| historical(&mut store, &definitions, paragraphs));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rescan);
criterion_main!(benches);
