//! Document -> rows conversion.

use std::collections::HashSet;
use std::io::Write;

use indexmap::IndexSet;

use crate::config::{ConversionConfig, DEFAULT_CHUNK_SIZE};
use crate::error::{ConversionError, Location, Result};
use crate::input::{DELIMITER, QUOTE};
use crate::model::{BiomarkerComponent, BiomarkerRecord, EvidenceSource};
use crate::report::{ConversionWarning, Diagnostics, WarningKind};
use crate::schema::{
    classify_tag, ObjectContext, Row, TagScope, COLUMNS, EVIDENCE_SEPARATOR, ROLE_SEPARATOR,
    TAG_SEPARATOR,
};

use super::buffer::{EvidenceKey, RowBuffer, SpliceOutcome};

/// Counters and warnings from one flatten run.
#[derive(Debug, Clone, Default)]
pub struct FlattenSummary {
    /// Records read.
    pub records: usize,
    /// Rows written.
    pub rows: usize,
    /// Evidence rows written.
    pub evidence_rows: usize,
    /// Record-scoped evidence whose new tags were spliced onto an existing row.
    pub spliced: usize,
    /// Record-scoped evidence skipped as a pure duplicate.
    pub duplicates: usize,
    /// Times the buffer was flushed.
    pub flushes: usize,
    pub warnings: Vec<ConversionWarning>,
}

/// Converts biomarker records into the minimal set of rows that rebuilds them.
#[derive(Debug, Clone)]
pub struct FlattenEngine {
    chunk_size: usize,
    log_checkpoints: bool,
}

impl Default for FlattenEngine {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_checkpoints: false,
        }
    }
}

impl FlattenEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from a conversion configuration.
    pub fn with_config(config: &ConversionConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            log_checkpoints: config.log_checkpoints,
        }
    }

    /// Flatten into memory without intermediate flushes.
    ///
    /// Tag splicing therefore covers the whole document.
    pub fn flatten_rows(&self, records: &[BiomarkerRecord]) -> Result<(Vec<Row>, FlattenSummary)> {
        let engine = Self {
            chunk_size: usize::MAX,
            log_checkpoints: false,
        };
        let mut rows = Vec::new();
        let summary = engine.flatten_with(records, |chunk| {
            rows.extend(chunk);
            Ok(())
        })?;
        Ok((rows, summary))
    }

    /// Flatten and write TSV (header included) to `writer`.
    pub fn write_tsv<W: Write>(&self, records: &[BiomarkerRecord], writer: W) -> Result<FlattenSummary> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .quote(QUOTE)
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(COLUMNS)?;

        let summary = self.flatten_with(records, |chunk| {
            for row in &chunk {
                writer.serialize(row)?;
            }
            writer.flush().map_err(|e| ConversionError::Csv(e.into()))?;
            Ok(())
        })?;

        writer.flush().map_err(|e| ConversionError::Csv(e.into()))?;
        Ok(summary)
    }

    /// Flatten, handing each checkpoint's rows to `sink` in output order.
    ///
    /// Checkpoints fall on record boundaries once at least `chunk_size` rows
    /// are buffered.
    pub fn flatten_with<F>(&self, records: &[BiomarkerRecord], mut sink: F) -> Result<FlattenSummary>
    where
        F: FnMut(Vec<Row>) -> Result<()>,
    {
        let mut buffer = RowBuffer::new();
        let mut summary = FlattenSummary::default();
        let mut diagnostics = Diagnostics::new();

        for (index, record) in records.iter().enumerate() {
            let mut pass = RecordPass::new(index, record, &mut buffer, &mut summary)?;
            pass.check_tags(&mut diagnostics);
            pass.run()?;
            summary.records += 1;

            if buffer.len() >= self.chunk_size {
                let rows = buffer.drain();
                summary.rows += rows.len();
                summary.flushes += 1;
                sink(rows)?;
                if self.log_checkpoints {
                    tracing::info!(entry = index, rows = summary.rows, "Write checkpoint hit, dumping");
                }
            }
        }

        if !buffer.is_empty() {
            let rows = buffer.drain();
            summary.rows += rows.len();
            summary.flushes += 1;
            sink(rows)?;
        }

        summary.warnings = diagnostics.into_warnings();
        tracing::info!(
            records = summary.records,
            rows = summary.rows,
            spliced = summary.spliced,
            duplicates = summary.duplicates,
            "Flatten complete"
        );
        Ok(summary)
    }
}

/// Record-level column values shared by every row of a record.
struct RecordColumns {
    condition: String,
    condition_id: String,
    exposure_agent: String,
    exposure_agent_id: String,
    roles: String,
}

/// State for flattening one record.
struct RecordPass<'a> {
    index: usize,
    record: &'a BiomarkerRecord,
    columns: RecordColumns,
    buffer: &'a mut RowBuffer,
    summary: &'a mut FlattenSummary,
    /// Evidence emitted anywhere in this record.
    overall_seen: HashSet<EvidenceKey>,
}

impl<'a> RecordPass<'a> {
    fn new(
        index: usize,
        record: &'a BiomarkerRecord,
        buffer: &'a mut RowBuffer,
        summary: &'a mut FlattenSummary,
    ) -> Result<Self> {
        if record.biomarker_id.trim().is_empty() {
            return Err(ConversionError::missing(Location::Entry(index), "biomarker_id"));
        }
        if record.biomarker_component.is_empty() {
            return Err(ConversionError::missing(
                Location::Entry(index),
                "biomarker_component",
            ));
        }

        let (condition, condition_id) = record.condition_columns();
        let (exposure_agent, exposure_agent_id) = record.exposure_agent_columns();
        let columns = RecordColumns {
            condition: condition.to_string(),
            condition_id: condition_id.to_string(),
            exposure_agent: exposure_agent.to_string(),
            exposure_agent_id: exposure_agent_id.to_string(),
            roles: record.role_names().collect::<Vec<_>>().join(ROLE_SEPARATOR),
        };

        Ok(Self {
            index,
            record,
            columns,
            buffer,
            summary,
            overall_seen: HashSet::new(),
        })
    }

    /// Warn once per evidence source about tags outside the tag model.
    fn check_tags(&self, diagnostics: &mut Diagnostics) {
        let component_evidence = self
            .record
            .biomarker_component
            .iter()
            .flat_map(|c| c.evidence_source.iter());

        for evidence in component_evidence.chain(self.record.evidence_source.iter()) {
            for token in evidence.tag_tokens() {
                let classified = classify_tag(token, &ObjectContext::default());
                if classified.scope == TagScope::Unrecognized {
                    diagnostics.warn(
                        WarningKind::UnrecognizedTag,
                        format!(
                            "Unrecognized tag '{}' on evidence {} of biomarker {}",
                            token,
                            evidence.source_label(),
                            self.record.biomarker_id
                        ),
                        Some(self.index),
                    );
                }
            }
        }
    }

    fn run(&mut self) -> Result<()> {
        let record = self.record;

        for (component_idx, component) in record.biomarker_component.iter().enumerate() {
            if component.assessed_biomarker_entity_id.trim().is_empty() {
                return Err(ConversionError::missing(
                    Location::Component {
                        entry: self.index,
                        component: component_idx,
                    },
                    "assessed_biomarker_entity_id",
                ));
            }

            let mut seen = HashSet::new();

            if component.specimen.is_empty() {
                let context = SpecimenColumns::default();
                self.flatten_context(component, &context, &mut seen);
            } else {
                for specimen in &component.specimen {
                    let context = SpecimenColumns {
                        name: specimen.name.clone(),
                        id: specimen.id.clone(),
                        loinc_code: specimen.loinc_code.clone(),
                    };
                    self.flatten_context(component, &context, &mut seen);
                }
            }
        }

        Ok(())
    }

    /// Emit the rows for one component/specimen context.
    fn flatten_context(
        &mut self,
        component: &BiomarkerComponent,
        specimen: &SpecimenColumns,
        seen: &mut HashSet<EvidenceKey>,
    ) {
        let context = ObjectContext::new(specimen.id.clone(), specimen.loinc_code.clone());
        let mut emitted = false;

        // Component evidence always gets its own row when applicable.
        for evidence in &component.evidence_source {
            let tags = matching_tags(evidence, &context);
            if tags.is_empty() {
                continue;
            }

            let key = self.evidence_key(evidence);
            seen.insert(key.clone());
            self.overall_seen.insert(key.clone());
            let row = self.evidence_row(component, specimen, evidence, &tags);
            self.buffer.push_evidence(key, row);
            self.summary.evidence_rows += 1;
            emitted = true;
        }

        // Record evidence is folded into rows already carrying the same evidence.
        for evidence in &self.record.evidence_source {
            let tags = matching_tags(evidence, &context);
            if tags.is_empty() {
                continue;
            }

            let key = self.evidence_key(evidence);
            if seen.contains(&key) || self.overall_seen.contains(&key) {
                match self.buffer.splice_tags(&key, &tags) {
                    SpliceOutcome::Duplicate => {
                        self.summary.duplicates += 1;
                        continue;
                    }
                    SpliceOutcome::Spliced { added } => {
                        tracing::debug!(
                            biomarker_id = %self.record.biomarker_id,
                            source = %key.source,
                            added,
                            "Spliced record evidence tags onto existing row"
                        );
                        self.summary.spliced += 1;
                        continue;
                    }
                    SpliceOutcome::NotBuffered => {
                        // Already flushed; write it again rather than lose the tags.
                    }
                    SpliceOutcome::OutOfScope => {
                        // No row for this specimen yet; this context gets its own.
                    }
                }
            }

            self.overall_seen.insert(key.clone());
            let row = self.evidence_row(component, specimen, evidence, &tags);
            self.buffer.push_evidence(key, row);
            self.summary.evidence_rows += 1;
            emitted = true;
        }

        if !emitted {
            let row = self.context_row(component, specimen);
            self.buffer.push(row);
        }
    }

    fn evidence_key(&self, evidence: &EvidenceSource) -> EvidenceKey {
        EvidenceKey::new(
            self.record.biomarker_id.clone(),
            evidence.source_label(),
            evidence.joined_text(EVIDENCE_SEPARATOR),
        )
    }

    /// A row with the context columns and empty evidence columns.
    fn context_row(&self, component: &BiomarkerComponent, specimen: &SpecimenColumns) -> Row {
        Row {
            biomarker_id: self.record.biomarker_id.clone(),
            biomarker: component.biomarker.clone(),
            assessed_biomarker_entity: component.assessed_biomarker_entity.recommended_name.clone(),
            assessed_biomarker_entity_id: component.assessed_biomarker_entity_id.clone(),
            assessed_entity_type: component.assessed_entity_type.clone(),
            condition: self.columns.condition.clone(),
            condition_id: self.columns.condition_id.clone(),
            exposure_agent: self.columns.exposure_agent.clone(),
            exposure_agent_id: self.columns.exposure_agent_id.clone(),
            best_biomarker_role: self.columns.roles.clone(),
            specimen: specimen.name.clone(),
            specimen_id: specimen.id.clone(),
            loinc_code: specimen.loinc_code.clone(),
            evidence_source: String::new(),
            evidence: String::new(),
            tag: String::new(),
        }
    }

    fn evidence_row(
        &self,
        component: &BiomarkerComponent,
        specimen: &SpecimenColumns,
        evidence: &EvidenceSource,
        tags: &IndexSet<String>,
    ) -> Row {
        let mut row = self.context_row(component, specimen);
        row.evidence_source = evidence.source_label();
        row.evidence = evidence.joined_text(EVIDENCE_SEPARATOR);
        row.tag = tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR);
        row
    }
}

/// Specimen columns of the context being flattened.
#[derive(Debug, Default)]
struct SpecimenColumns {
    name: String,
    id: String,
    loinc_code: String,
}

/// Tags of `evidence` that apply in `context`, in declaration order.
fn matching_tags(evidence: &EvidenceSource, context: &ObjectContext) -> IndexSet<String> {
    evidence
        .tag_tokens()
        .map(str::trim)
        .filter(|token| classify_tag(token, context).matches)
        .map(str::to_string)
        .collect()
}
