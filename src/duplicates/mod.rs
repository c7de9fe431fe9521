//! Content-hash duplicate detection.
//!
//! - [`finder`]: walk and hash a tree
//! - [`groups`]: group files by digest and render findings

pub mod finder;
pub mod groups;

pub use finder::{dedup_report, duplicate_paths, DedupSummary, DuplicateFinder, FinderError};
pub use groups::{group_by_hash, DuplicateGroup};
