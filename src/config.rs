//! Level configuration and numbering definitions.
//!
//! Each `(ListId, Level)` pair carries a start value, a restart policy, and a
//! flag that isolates the list from its abstract siblings. Definitions arrive
//! from outside the engine, usually parsed out of a source document; the
//! `Definitions` type here is a plain-data form of them that can be built in
//! code or loaded from JSON:
//!
//! ```json
//! { "lists": [ { "id": 1, "abstractId": 10,
//!                "levels": [ { "level": 0, "start": 1, "restart": null } ] } ] }
//! ```

use std::num::NonZeroU8;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Error as _;

use crate::error::Result;
use crate::ids::AbstractId;
use crate::ids::Count;
use crate::ids::Level;
use crate::ids::ListId;

/// When a level's counter falls back to its start value.
///
/// The raw form is `integer | null`: `null` is `AnyShallower`, `0` is `Never`,
/// and any other `R` is `UpTo(R)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum Restart {
    /// Restart whenever any shallower level was used since the previous sibling.
    #[default]
    AnyShallower,
    /// Always continue from the previous sibling.
    Never,
    /// Restart only if a level `<= R` was used since the previous sibling.
    /// A zero threshold is spelled `Never`.
    UpTo(NonZeroU8),
}

impl Restart {
    /// Map the raw `integer | null` form.
    pub fn from_raw(raw: Option<u32>) -> Restart {
        return match raw {
            None => Restart::AnyShallower,
            Some(0) => Restart::Never,
            Some(r) => match NonZeroU8::new(r.min(Level::MAX as u32) as Level) {
                Some(threshold) => Restart::UpTo(threshold),
                None => Restart::Never,
            },
        };
    }

    /// `UpTo(threshold)`, or `None` if `threshold` is zero.
    pub fn up_to(threshold: Level) -> Option<Restart> {
        return NonZeroU8::new(threshold).map(Restart::UpTo);
    }

    /// The raw `integer | null` form.
    pub fn to_raw(self) -> Option<u32> {
        return match self {
            Restart::AnyShallower => None,
            Restart::Never => Some(0),
            Restart::UpTo(r) => Some(r.get() as u32),
        };
    }

    /// Whether use of `used` levels between two siblings resets the counter.
    /// `used` must only hold levels shallower than the sibling's own.
    pub fn fires(self, used: &[Level]) -> bool {
        if used.is_empty() {
            return false;
        }
        return match self {
            Restart::AnyShallower => true,
            Restart::Never => false,
            Restart::UpTo(r) => used.iter().any(|&level| level <= r.get()),
        };
    }
}

impl From<Option<u32>> for Restart {
    fn from(raw: Option<u32>) -> Restart {
        return Restart::from_raw(raw);
    }
}

impl From<Restart> for Option<u32> {
    fn from(restart: Restart) -> Option<u32> {
        return restart.to_raw();
    }
}

fn default_start() -> Count {
    return 1;
}

fn positive_start<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Count, D::Error> {
    let start = Count::deserialize(deserializer)?;
    if start == 0 {
        return Err(D::Error::custom("start value must be at least 1"));
    }
    return Ok(start);
}

/// Static configuration of one `(ListId, Level)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLevelConfig {
    /// The numeral a level begins at when no relevant previous sibling exists.
    /// At least 1; the loader rejects 0.
    #[serde(default = "default_start", deserialize_with = "positive_start")]
    pub start: Count,
    #[serde(default)]
    pub restart: Restart,
    /// Count this list on its own instead of against its abstract definition.
    #[serde(default)]
    pub start_overridden: bool,
}

impl Default for ListLevelConfig {
    fn default() -> Self {
        return ListLevelConfig {
            start: default_start(),
            restart: Restart::AnyShallower,
            start_overridden: false,
        };
    }
}

impl ListLevelConfig {
    pub fn new(start: Count, restart: Restart) -> ListLevelConfig {
        return ListLevelConfig {
            start,
            restart,
            start_overridden: false,
        };
    }

    pub fn overridden(mut self) -> ListLevelConfig {
        self.start_overridden = true;
        return self;
    }
}

/// A level's configuration together with the abstract definition it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelDefinition {
    pub abstract_id: AbstractId,
    pub config: ListLevelConfig,
}

/// One level entry as it appears in a definitions file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub level: Level,
    #[serde(flatten)]
    pub config: ListLevelConfig,
}

/// One numbering instance as it appears in a definitions file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDefinition {
    pub id: ListId,
    pub abstract_id: AbstractId,
    #[serde(default)]
    pub levels: Vec<LevelEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct DefinitionsFile {
    #[serde(default)]
    lists: Vec<ListDefinition>,
}

/// Every known numbering instance, indexed by list id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "DefinitionsFile", into = "DefinitionsFile")]
pub struct Definitions {
    lists: Vec<ListDefinition>,
    by_id: FxHashMap<ListId, usize>,
}

impl From<DefinitionsFile> for Definitions {
    fn from(file: DefinitionsFile) -> Definitions {
        let mut definitions = Definitions::new();
        for list in file.lists {
            for entry in list.levels {
                definitions.insert(list.id, list.abstract_id, entry.level, entry.config);
            }
            // A list with no levels is still known, it just numbers with defaults.
            definitions.list_mut(list.id, list.abstract_id);
        }
        return definitions;
    }
}

impl From<Definitions> for DefinitionsFile {
    fn from(definitions: Definitions) -> DefinitionsFile {
        return DefinitionsFile { lists: definitions.lists };
    }
}

impl Definitions {
    pub fn new() -> Definitions {
        return Definitions {
            lists: Vec::new(),
            by_id: FxHashMap::default(),
        };
    }

    /// Parse definitions from their JSON form.
    pub fn from_json(json: &str) -> Result<Definitions> {
        return Ok(serde_json::from_str(json)?);
    }

    /// Serialize definitions to their JSON form.
    pub fn to_json(&self) -> Result<String> {
        return Ok(serde_json::to_string_pretty(self)?);
    }

    fn list_mut(&mut self, id: ListId, abstract_id: AbstractId) -> &mut ListDefinition {
        let index = match self.by_id.get(&id) {
            Some(&index) => index,
            None => {
                self.lists.push(ListDefinition { id, abstract_id, levels: Vec::new() });
                self.by_id.insert(id, self.lists.len() - 1);
                self.lists.len() - 1
            }
        };
        let list = &mut self.lists[index];
        list.abstract_id = abstract_id;
        return list;
    }

    /// Add or replace the configuration of one level. Last write wins.
    pub fn insert(&mut self, id: ListId, abstract_id: AbstractId, level: Level, config: ListLevelConfig) {
        let list = self.list_mut(id, abstract_id);
        if let Some(entry) = list.levels.iter_mut().find(|entry| entry.level == level) {
            entry.config = config;
            return;
        }
        list.levels.push(LevelEntry { level, config });
    }

    /// Look up a list by id.
    pub fn list(&self, id: ListId) -> Option<&ListDefinition> {
        return self.by_id.get(&id).map(|&index| &self.lists[index]);
    }

    /// Resolve the definition governing one level of a list.
    ///
    /// A known list with no entry for `level` resolves to the default
    /// configuration. An unknown list does not resolve.
    pub fn level(&self, id: ListId, level: Level) -> Option<LevelDefinition> {
        let list = self.list(id)?;
        let config = list
            .levels
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.config)
            .unwrap_or_default();
        return Some(LevelDefinition { abstract_id: list.abstract_id, config });
    }

    /// Iterate over every configured `(list, level)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (ListId, Level, LevelDefinition)> + '_ {
        return self.lists.iter().flat_map(|list| {
            list.levels.iter().map(move |entry| {
                let definition = LevelDefinition {
                    abstract_id: list.abstract_id,
                    config: entry.config,
                };
                (list.id, entry.level, definition)
            })
        });
    }

    pub fn len(&self) -> usize {
        return self.lists.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.lists.is_empty();
    }
}
