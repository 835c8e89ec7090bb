//! Errors raised by the scan driver and the definitions loader.
//!
//! The counter store itself never fails: absent data resolves to `None` or to a
//! level's start value. Only misuse of a scan pass and malformed input surface
//! here.

use thiserror::Error;

use crate::ids::Position;

#[derive(Debug, Error)]
pub enum ScanError {
    /// A pass visited a position that does not come after the previous one.
    #[error("position {position} visited after {previous}; a pass must visit positions in ascending order")]
    OutOfOrder { previous: Position, position: Position },

    /// A pass was used again after it had been abandoned.
    #[error("scan pass was abandoned after an ordering violation")]
    Poisoned,

    #[error("invalid numbering input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A paragraph named a list without a level, or a level without a list.
#[derive(Debug, Error)]
#[error("paragraph at {position} must give both `list` and `level` or neither")]
pub struct PartialNumbering {
    pub position: Position,
}

pub type Result<T> = std::result::Result<T, ScanError>;
