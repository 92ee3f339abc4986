//! Rows -> document conversion.

mod builder;
mod engine;
mod merge;

pub use builder::{RowBuilder, RowTags};
pub use engine::{RebuildEngine, RebuildSummary};
pub use merge::{merge_evidence, merge_specimen, EvidenceMerge};
