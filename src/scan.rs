//! Full-document rescans over a `CounterStore`.
//!
//! The store is only fast and correct in cache mode if list paragraphs are
//! visited in ascending document order, each one calculated, committed, and
//! resolved to a path before the next. A `ScanPass` makes that discipline
//! part of the API:
//!
//! - it borrows the store mutably for its whole lifetime, so two passes can
//!   never interleave on one store
//! - it rejects a position that doesn't come after the previous one, clears
//!   the store, and refuses further work
//! - it turns cache mode off when dropped, whether the pass finished or not
//!
//! `rescan` drives a pass over a sequence of paragraphs, resolving each
//! paragraph's definition and handing the result to a `MarkerSink`.
//!
//! # Example
//!
//! ```
//! use numbering::config::Definitions;
//! use numbering::ids::{AbstractId, ListId};
//! use numbering::config::ListLevelConfig;
//! use numbering::scan::{rescan, Paragraph, Rendered};
//! use numbering::store::CounterStore;
//!
//! let mut definitions = Definitions::new();
//! definitions.insert(ListId(1), AbstractId(1), 0, ListLevelConfig::default());
//! definitions.insert(ListId(1), AbstractId(1), 1, ListLevelConfig::default());
//!
//! let paragraphs = vec![
//!     Paragraph::numbered(0, ListId(1), 0),
//!     Paragraph::numbered(1, ListId(1), 1),
//!     Paragraph::plain(2),
//!     Paragraph::numbered(3, ListId(1), 1),
//! ];
//!
//! let mut store = CounterStore::new();
//! let mut rendered: Vec<Rendered> = Vec::new();
//! rescan(&mut store, &definitions, paragraphs, &mut rendered).unwrap();
//!
//! let paths: Vec<_> = rendered.iter().map(|r| r.path().map(|p| p.to_vec())).collect();
//! assert_eq!(paths, vec![Some(vec![1]), Some(vec![1, 1]), None, Some(vec![1, 2])]);
//! ```

use serde::Deserialize;
use serde::Serialize;

use crate::cache::CacheStats;
use crate::config::Definitions;
use crate::config::LevelDefinition;
use crate::error::PartialNumbering;
use crate::error::Result;
use crate::error::ScanError;
use crate::ids::AbstractId;
use crate::ids::Count;
use crate::ids::Level;
use crate::ids::ListId;
use crate::ids::Position;
use crate::store::CounterStore;
use crate::store::Path;

/// Source of numbering definitions.
pub trait DefinitionsProvider {
    /// The definition governing one level of a list, if the list is known.
    fn level(&self, list: ListId, level: Level) -> Option<LevelDefinition>;

    /// Every configured `(list, level)` pair, used to seed a store.
    fn levels(&self) -> impl Iterator<Item = (ListId, Level, LevelDefinition)> + '_;
}

impl DefinitionsProvider for Definitions {
    fn level(&self, list: ListId, level: Level) -> Option<LevelDefinition> {
        return Definitions::level(self, list, level);
    }

    fn levels(&self) -> impl Iterator<Item = (ListId, Level, LevelDefinition)> + '_ {
        return self.iter();
    }
}

/// Receiver of computed markers.
pub trait MarkerSink {
    /// A list paragraph was numbered.
    fn render(&mut self, position: Position, numbered: &Numbered);

    /// A paragraph has no resolvable numbering; drop any marker it had.
    fn clear(&mut self, position: Position);
}

/// A paragraph's numbering reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    pub list: ListId,
    pub level: Level,
}

/// One paragraph as the document walker reports it.
///
/// In JSON a list paragraph carries both `list` and `level`; a plain one
/// carries neither.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ParagraphFields", into = "ParagraphFields")]
pub struct Paragraph {
    pub position: Position,
    pub numbering: Option<NumberingRef>,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct ParagraphFields {
    position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list: Option<ListId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<Level>,
}

impl TryFrom<ParagraphFields> for Paragraph {
    type Error = PartialNumbering;

    fn try_from(fields: ParagraphFields) -> std::result::Result<Paragraph, PartialNumbering> {
        let numbering = match (fields.list, fields.level) {
            (Some(list), Some(level)) => Some(NumberingRef { list, level }),
            (None, None) => None,
            _ => return Err(PartialNumbering { position: fields.position }),
        };
        return Ok(Paragraph { position: fields.position, numbering });
    }
}

impl From<Paragraph> for ParagraphFields {
    fn from(paragraph: Paragraph) -> ParagraphFields {
        return ParagraphFields {
            position: paragraph.position,
            list: paragraph.numbering.map(|numbering| numbering.list),
            level: paragraph.numbering.map(|numbering| numbering.level),
        };
    }
}

impl Paragraph {
    pub fn numbered(position: Position, list: ListId, level: Level) -> Paragraph {
        return Paragraph {
            position,
            numbering: Some(NumberingRef { list, level }),
        };
    }

    pub fn plain(position: Position) -> Paragraph {
        return Paragraph { position, numbering: None };
    }
}

/// The numbering computed for one list paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Numbered {
    pub list: ListId,
    pub level: Level,
    pub abstract_id: AbstractId,
    pub count: Count,
    /// Ancestor counters followed by `count`.
    pub path: Path,
}

/// A sink entry recording what happened to one paragraph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub position: Position,
    pub numbered: Option<Numbered>,
}

impl Rendered {
    pub fn path(&self) -> Option<&[Count]> {
        return self.numbered.as_ref().map(|numbered| numbered.path.as_slice());
    }
}

impl MarkerSink for Vec<Rendered> {
    fn render(&mut self, position: Position, numbered: &Numbered) {
        self.push(Rendered {
            position,
            numbered: Some(numbered.clone()),
        });
    }

    fn clear(&mut self, position: Position) {
        self.push(Rendered { position, numbered: None });
    }
}

/// What a finished pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub numbered: usize,
    pub cleared: usize,
    /// Last-seen cache lookups.
    pub stats: CacheStats,
    /// Ancestor-path memo lookups.
    pub path_stats: CacheStats,
}

/// One ascending pass over a document, holding its store exclusively.
pub struct ScanPass<'a> {
    store: &'a mut CounterStore,
    last: Option<Position>,
    poisoned: bool,
    numbered: usize,
    cleared: usize,
}

impl CounterStore {
    /// Start a full rescan: reset the store and turn cache mode on until the
    /// returned pass is dropped.
    pub fn begin_pass(&mut self) -> ScanPass<'_> {
        self.enable_cache();
        return ScanPass {
            store: self,
            last: None,
            poisoned: false,
            numbered: 0,
            cleared: 0,
        };
    }
}

impl ScanPass<'_> {
    /// Record the configuration of every level the provider knows.
    pub fn seed<D: DefinitionsProvider>(&mut self, definitions: &D) {
        for (list, level, definition) in definitions.levels() {
            self.store.set_start_settings(list, level, definition.config);
        }
    }

    /// Calculate, commit, and resolve the path of one list paragraph.
    pub fn visit(&mut self, position: Position, list: ListId, level: Level, abstract_id: AbstractId) -> Result<Numbered> {
        self.advance(position)?;

        let count = self.store.calculate_counter(list, level, position, abstract_id);
        self.store.set_counter(list, level, position, count, abstract_id);
        let mut path = self.store.ancestors_path(list, level, position);
        path.push(count);

        self.numbered += 1;
        return Ok(Numbered { list, level, abstract_id, count, path });
    }

    /// Note a paragraph that carries no numbering in this pass.
    pub fn skip(&mut self, position: Position) -> Result<()> {
        self.advance(position)?;
        self.cleared += 1;
        return Ok(());
    }

    fn advance(&mut self, position: Position) -> Result<()> {
        if self.poisoned {
            return Err(ScanError::Poisoned);
        }
        if let Some(previous) = self.last {
            if position <= previous {
                self.abandon();
                return Err(ScanError::OutOfOrder { previous, position });
            }
        }
        self.last = Some(position);
        return Ok(());
    }

    /// Drop everything committed so far. Partial counters from an abandoned
    /// pass would otherwise look valid to the next one.
    fn abandon(&mut self) {
        tracing::warn!(
            numbered = self.numbered,
            cleared = self.cleared,
            "abandoning numbering pass"
        );
        self.store.clear();
        self.poisoned = true;
    }

    /// Read access to the store mid-pass.
    pub fn store(&self) -> &CounterStore {
        return &*self.store;
    }

    pub fn is_poisoned(&self) -> bool {
        return self.poisoned;
    }

    /// End the pass, turning cache mode off.
    pub fn finish(self) -> ScanSummary {
        return ScanSummary {
            numbered: self.numbered,
            cleared: self.cleared,
            stats: self.store.stats(),
            path_stats: self.store.path_stats(),
        };
    }
}

impl Drop for ScanPass<'_> {
    fn drop(&mut self) {
        self.store.disable_cache();
    }
}

/// Number every paragraph of a document in one pass.
///
/// Paragraphs must arrive in ascending position order. A paragraph whose
/// list is unknown to `definitions` is treated as unnumbered and cleared.
pub fn rescan<D, I, S>(store: &mut CounterStore, definitions: &D, paragraphs: I, sink: &mut S) -> Result<ScanSummary>
where
    D: DefinitionsProvider,
    I: IntoIterator<Item = Paragraph>,
    S: MarkerSink,
{
    let mut pass = store.begin_pass();
    // Entering the pass wiped the configuration, so seed after it.
    pass.seed(definitions);

    for paragraph in paragraphs {
        let resolved = paragraph
            .numbering
            .and_then(|numbering| Some((numbering, definitions.level(numbering.list, numbering.level)?)));

        match resolved {
            Some((numbering, definition)) => {
                let numbered = pass.visit(paragraph.position, numbering.list, numbering.level, definition.abstract_id)?;
                sink.render(paragraph.position, &numbered);
            }
            None => {
                pass.skip(paragraph.position)?;
                sink.clear(paragraph.position);
            }
        }
    }

    let summary = pass.finish();
    tracing::debug!(
        numbered = summary.numbered,
        cleared = summary.cleared,
        hits = summary.stats.hits,
        misses = summary.stats.misses,
        "numbering pass finished"
    );
    return Ok(summary);
}
