//! Identifiers and scalar aliases shared by the store and the scan driver.
//!
//! A list paragraph is addressed by three coordinates:
//!
//! - `ListId`: the numbering instance it references (a Word `numId`)
//! - `Level`: its zero-based outline depth inside that instance
//! - `Position`: its index in document order
//!
//! Several list ids may share one `AbstractId` (a Word `abstractNumId`). Levels
//! that are not overridden count against the abstract definition, so copied
//! lists keep counting where their siblings left off.

use serde::Deserialize;
use serde::Serialize;

/// Zero-based outline depth. Word stops at 8.
pub type Level = u8;

/// Document-order index of a list paragraph.
pub type Position = u64;

/// A rendered numeral value.
pub type Count = u32;

/// Identifier of one numbering instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub u32);

/// Identifier of the base definition one or more list ids reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbstractId(pub u32);

impl std::fmt::Display for ListId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "list#{}", self.0);
    }
}

impl std::fmt::Display for AbstractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "abstract#{}", self.0);
    }
}
