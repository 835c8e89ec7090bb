//! Numbering - Word-style list numbering resolution.
//!
//! Computes the counter and the full ancestor path (`[2, 4, 1]`, rendered
//! elsewhere as "2.4.1") of every list paragraph in a document, honoring
//! outline restart rules that depend on document order, shared abstract
//! definitions, per-level restart thresholds, and start overrides.
//!
//! Formatting a path into marker text, deciding which paragraphs are list
//! items, and walking the document all live outside this crate.
//!
//! # Quick Start
//!
//! ```
//! use numbering::ids::{AbstractId, ListId};
//! use numbering::store::CounterStore;
//!
//! let list = ListId(1);
//! let base = AbstractId(1);
//! let mut store = CounterStore::new();
//!
//! // Propose, then commit, each paragraph in document order.
//! for (position, level) in [(10, 0), (11, 0), (13, 1), (14, 1), (15, 0), (16, 1)] {
//!     let count = store.calculate_counter(list, level, position, base);
//!     store.set_counter(list, level, position, count, base);
//! }
//!
//! assert_eq!(store.calculate_path(list, 1, 14).unwrap().as_slice(), &[2, 2]);
//! assert_eq!(store.calculate_path(list, 1, 16).unwrap().as_slice(), &[3, 1]);
//! ```
//!
//! For full rescans use `scan::rescan` or a `scan::ScanPass`, which turn on
//! the store's cache and enforce the ascending visit order it relies on.

pub mod cache;
pub mod config;
pub mod error;
pub mod ids;
pub mod scan;
pub mod store;
pub mod table;

pub use error::Result;
pub use error::ScanError;
