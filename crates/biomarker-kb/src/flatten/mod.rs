//! Document -> rows conversion.
//!
//! Each record is expanded to one row per (component, specimen) context and
//! applicable evidence source. Record-scoped evidence that repeats evidence
//! already written for the record is folded into the existing row's tag
//! column instead of producing another row.

mod buffer;
mod engine;

pub use buffer::{EvidenceKey, RowBuffer, SpliceOutcome};
pub use engine::{FlattenEngine, FlattenSummary};
