//! File-level conversion between the document and table formats.

use std::io::Write;
use std::path::Path;

use crate::config::ConversionConfig;
use crate::enrich::MetadataLookup;
use crate::error::{ConversionError, Result};
use crate::flatten::{FlattenEngine, FlattenSummary};
use crate::input::{load_document, RowReader};
use crate::model::BiomarkerRecord;
use crate::output::AtomicOutput;
use crate::rebuild::{RebuildEngine, RebuildSummary};
use crate::report::{ConversionReport, Direction, SourceMetadata};
use crate::schema::Row;

/// Main entry point for conversions.
///
/// # Example
///
/// ```no_run
/// use biomarker_kb::{ConversionConfig, Converter};
///
/// let mut converter = Converter::new(ConversionConfig::default());
/// let report = converter.convert("biomarkers.json", "biomarkers.tsv").unwrap();
/// println!("{} records -> {} rows", report.records, report.rows);
/// ```
pub struct Converter {
    config: ConversionConfig,
    lookup: Option<Box<dyn MetadataLookup>>,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            lookup: None,
        }
    }

    /// Use `lookup` for rebuild enrichment when `metadata` is enabled.
    pub fn with_lookup(mut self, lookup: impl MetadataLookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert `source` into `target`, choosing the direction from the file
    /// extensions.
    pub fn convert(
        &mut self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<ConversionReport> {
        let (source, target) = (source.as_ref(), target.as_ref());
        match infer_direction(source, target)? {
            Direction::Flatten => self.json_to_tsv(source, target),
            Direction::Rebuild => self.tsv_to_json(source, target),
        }
    }

    /// Flatten a JSON document into a TSV file.
    pub fn json_to_tsv(
        &self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<ConversionReport> {
        let (source, target) = (source.as_ref(), target.as_ref());
        let metadata = SourceMetadata::from_path(source)?;
        tracing::info!(source = %source.display(), target = %target.display(), "Converting JSON -> TSV");

        let records = load_document(source)?;
        let mut output = AtomicOutput::create(target)?;
        let summary = FlattenEngine::with_config(&self.config).write_tsv(&records, &mut output)?;
        output.commit()?;

        Ok(ConversionReport {
            source: metadata,
            target: target.to_path_buf(),
            direction: Direction::Flatten,
            records: summary.records,
            rows: summary.rows,
            warnings: summary.warnings,
        })
    }

    /// Rebuild a JSON document from a TSV file.
    pub fn tsv_to_json(
        &mut self,
        source: impl AsRef<Path>,
        target: impl AsRef<Path>,
    ) -> Result<ConversionReport> {
        let (source, target) = (source.as_ref(), target.as_ref());
        let metadata = SourceMetadata::from_path(source)?;
        tracing::info!(source = %source.display(), target = %target.display(), "Converting TSV -> JSON");

        let mut reader = RowReader::from_path(source)?;
        let mut engine = RebuildEngine::new(&self.config);
        if let Some(lookup) = self.lookup.as_deref_mut() {
            engine = engine.with_lookup(lookup);
        }
        for result in reader.rows() {
            let (number, row) = result?;
            engine.push_row(number, &row)?;
        }
        let (records, summary) = engine.finish()?;

        if let Some(lookup) = self.lookup.as_deref_mut() {
            lookup.finish()?;
        }

        let mut output = AtomicOutput::create(target)?;
        serde_json::to_writer_pretty(&mut output, &records)?;
        output
            .write_all(b"\n")
            .map_err(|e| ConversionError::io(target, e))?;
        output.commit()?;

        Ok(ConversionReport {
            source: metadata,
            target: target.to_path_buf(),
            direction: Direction::Rebuild,
            records: summary.records,
            rows: summary.rows,
            warnings: summary.warnings,
        })
    }

    /// Flatten records in memory.
    pub fn flatten_records(&self, records: &[BiomarkerRecord]) -> Result<(Vec<Row>, FlattenSummary)> {
        FlattenEngine::with_config(&self.config).flatten_rows(records)
    }

    /// Rebuild records from rows in memory. Rows are numbered from 1.
    pub fn rebuild_rows(&mut self, rows: &[Row]) -> Result<(Vec<BiomarkerRecord>, RebuildSummary)> {
        let mut engine = RebuildEngine::new(&self.config);
        if let Some(lookup) = self.lookup.as_deref_mut() {
            engine = engine.with_lookup(lookup);
        }
        for (index, row) in rows.iter().enumerate() {
            engine.push_row(index + 1, &row.clone().trimmed())?;
        }
        engine.finish()
    }
}

/// Pick the conversion direction from the source and target extensions.
pub fn infer_direction(source: &Path, target: &Path) -> Result<Direction> {
    let source_ext = extension(source);
    let target_ext = extension(target);

    match (source_ext.as_str(), target_ext.as_str()) {
        ("json", "tsv") => Ok(Direction::Flatten),
        ("tsv", "json") => Ok(Direction::Rebuild),
        ("json", "nt") => Err(ConversionError::UnsupportedConversion(
            "N-Triples output is not supported".to_string(),
        )),
        _ => Err(ConversionError::UnsupportedConversion(format!(
            "cannot convert '{}' to '{}' (expected .json -> .tsv or .tsv -> .json)",
            source.display(),
            target.display()
        ))),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
