//! biomarker-kb: converts a biomarker knowledge base between its JSON
//! document model and a 16-column TSV curation table.
//!
//! The document holds one record per biomarker with nested components,
//! specimens, conditions and evidence. The table holds one row per
//! (component, specimen, evidence source) combination so curators can edit
//! it in a spreadsheet.
//!
//! # Core Principles
//!
//! - **Lossless**: flattening a rebuilt document and rebuilding it again
//!   gives the same document, up to ordering
//! - **Tag scoped**: evidence tags decide which rows an evidence source
//!   appears on
//! - **All or nothing**: a failed run never leaves a partial output file
//!
//! # Example
//!
//! ```no_run
//! use biomarker_kb::{ConversionConfig, Converter};
//!
//! let mut converter = Converter::new(ConversionConfig::default());
//! let report = converter.convert("biomarkers.tsv", "biomarkers.json").unwrap();
//!
//! println!("Records: {}", report.records);
//! println!("Warnings: {}", report.warnings.len());
//! ```

pub mod config;
pub mod converter;
pub mod enrich;
pub mod error;
pub mod flatten;
pub mod input;
pub mod model;
pub mod output;
pub mod rebuild;
pub mod report;
pub mod schema;

pub use config::ConversionConfig;
pub use converter::{infer_direction, Converter};
pub use error::{ConversionError, Location, Result};
pub use flatten::{FlattenEngine, FlattenSummary};
pub use model::{BiomarkerComponent, BiomarkerRecord, EvidenceSource, Specimen};
pub use rebuild::{RebuildEngine, RebuildSummary};
pub use report::{ConversionReport, ConversionWarning, Direction, WarningKind};
pub use schema::{Row, COLUMNS};
