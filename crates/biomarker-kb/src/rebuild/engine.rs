//! Rows -> document conversion.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use crate::config::ConversionConfig;
use crate::enrich::MetadataLookup;
use crate::error::Result;
use crate::input::RowReader;
use crate::model::{
    BiomarkerComponent, BiomarkerRecord, Citation, Condition, ConditionSynonym, Identifier,
    Reference, Synonym,
};
use crate::report::{ConversionWarning, Diagnostics, WarningKind};
use crate::schema::{Row, ROLE_SEPARATOR};

use super::builder::RowBuilder;
use super::merge::{merge_evidence, merge_specimen, EvidenceMerge};

/// Counters and warnings from one rebuild run.
#[derive(Debug, Clone, Default)]
pub struct RebuildSummary {
    /// Records in the document.
    pub records: usize,
    /// Rows consumed.
    pub rows: usize,
    /// Components created.
    pub components: usize,
    /// Evidence candidates whose tags were unioned into an existing entry.
    pub tags_merged: usize,
    /// Evidence candidates already fully present.
    pub duplicates: usize,
    /// Citations added by enrichment.
    pub citations: usize,
    pub warnings: Vec<ConversionWarning>,
}

/// Incrementally builds a document from rows in stream order.
///
/// Rows for a `biomarker_id` already seen are merged into that record: a
/// row whose component key matches an existing component adds its specimen
/// and evidence to it, otherwise the row's component is appended.
pub struct RebuildEngine<'a> {
    config: &'a ConversionConfig,
    lookup: Option<&'a mut dyn MetadataLookup>,
    records: Vec<BiomarkerRecord>,
    record_index: HashMap<String, usize>,
    diagnostics: Diagnostics,
    summary: RebuildSummary,
}

impl<'a> RebuildEngine<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            lookup: None,
            records: Vec::new(),
            record_index: HashMap::new(),
            diagnostics: Diagnostics::new(),
            summary: RebuildSummary::default(),
        }
    }

    /// Use `lookup` for enrichment. Only consulted when `config.metadata` is set.
    pub fn with_lookup(mut self, lookup: &'a mut dyn MetadataLookup) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Read and merge every row of a TSV source, then finish.
    pub fn rebuild_tsv<R: Read>(mut self, source: R) -> Result<(Vec<BiomarkerRecord>, RebuildSummary)> {
        let mut reader = RowReader::new(source)?;
        for result in reader.rows() {
            let (number, row) = result?;
            self.push_row(number, &row)?;
        }
        self.finish()
    }

    /// Merge one row. `number` is the 1-based data row number used in errors.
    pub fn push_row(&mut self, number: usize, row: &Row) -> Result<()> {
        let config = self.config;
        let builder = RowBuilder::new(number, row, config);
        let entity_id = builder.validate()?;

        let tags = builder.tags(&mut self.diagnostics);
        let component_evidence = builder.evidence(tags.component, &mut self.diagnostics)?;
        let record_evidence = builder.evidence(tags.record, &mut self.diagnostics)?;
        let specimen = builder.specimen(&mut self.diagnostics);

        let mut candidate = builder.component();
        candidate.specimen.extend(specimen);
        candidate.evidence_source.extend(component_evidence);

        match self.record_index.get(&row.biomarker_id).copied() {
            None => {
                self.enrich_component(&mut candidate, &entity_id, number);
                let mut condition = builder.condition(&mut self.diagnostics)?;
                if let Some(condition) = condition.as_mut() {
                    self.enrich_condition(condition, number);
                }

                let record = BiomarkerRecord {
                    biomarker_id: row.biomarker_id.clone(),
                    biomarker_component: vec![candidate],
                    best_biomarker_role: builder.roles(),
                    condition,
                    exposure_agent: builder.exposure_agent(&mut self.diagnostics)?,
                    evidence_source: record_evidence.into_iter().collect(),
                    citation: Vec::new(),
                };

                self.summary.components += 1;
                self.record_index
                    .insert(row.biomarker_id.clone(), self.records.len());
                self.records.push(record);
            }
            Some(index) => {
                self.check_record_fields(index, row, number);

                let existing = self.records[index]
                    .biomarker_component
                    .iter()
                    .position(|c| c.key() == candidate.key());

                match existing {
                    None => {
                        tracing::debug!(
                            biomarker_id = %row.biomarker_id,
                            row = number,
                            entity = %candidate.assessed_biomarker_entity_id,
                            "Adding new component to existing record"
                        );
                        self.enrich_component(&mut candidate, &entity_id, number);
                        self.summary.components += 1;
                        self.records[index].biomarker_component.push(candidate);
                    }
                    Some(position) => {
                        let component = &mut self.records[index].biomarker_component[position];
                        for specimen in candidate.specimen {
                            if !merge_specimen(component, specimen) {
                                tracing::debug!(row = number, "Specimen already present");
                            }
                        }
                        for evidence in candidate.evidence_source {
                            let outcome = merge_evidence(&mut component.evidence_source, evidence);
                            count_merge(&mut self.summary, outcome);
                        }
                    }
                }

                if let Some(evidence) = record_evidence {
                    let outcome = merge_evidence(&mut self.records[index].evidence_source, evidence);
                    count_merge(&mut self.summary, outcome);
                }
            }
        }

        self.summary.rows += 1;
        if config.log_checkpoints && number % config.chunk_size.max(1) == 0 {
            tracing::info!(row = number, records = self.records.len(), "Log checkpoint");
        }
        Ok(())
    }

    /// Add citations and return the document.
    pub fn finish(mut self) -> Result<(Vec<BiomarkerRecord>, RebuildSummary)> {
        if self.config.metadata && self.lookup.is_some() {
            self.add_citations();
        }

        let mut summary = self.summary;
        summary.records = self.records.len();
        summary.warnings = self.diagnostics.into_warnings();
        tracing::info!(
            records = summary.records,
            rows = summary.rows,
            components = summary.components,
            "Rebuild complete"
        );
        Ok((self.records, summary))
    }

    /// The first row of a record sets its condition, exposure agent and roles.
    fn check_record_fields(&mut self, index: usize, row: &Row, number: usize) {
        let record = &self.records[index];
        let (condition, condition_id) = record.condition_columns();
        let (agent, agent_id) = record.exposure_agent_columns();
        let roles = record.role_names().collect::<Vec<_>>().join(ROLE_SEPARATOR);
        let row_roles = row.roles().collect::<Vec<_>>().join(ROLE_SEPARATOR);

        let mut conflicts = Vec::new();
        if condition != row.condition || condition_id != row.condition_id {
            conflicts.push("condition");
        }
        if agent != row.exposure_agent || agent_id != row.exposure_agent_id {
            conflicts.push("exposure_agent");
        }
        if roles != row_roles {
            conflicts.push("best_biomarker_role");
        }

        for field in conflicts {
            self.diagnostics.warn(
                WarningKind::ConflictingRecordField,
                format!(
                    "Biomarker {} has a different {} than its first row; keeping the first",
                    row.biomarker_id, field
                ),
                Some(number),
            );
        }
    }

    fn enrich_component(&mut self, component: &mut BiomarkerComponent, id: &Identifier, number: usize) {
        if !self.config.metadata {
            return;
        }
        let Some(lookup) = self.lookup.as_deref_mut() else {
            return;
        };

        let what = format!("entity {}", id);
        match lookup.lookup(&id.namespace_key(), &id.accession) {
            Ok(Some(found)) => {
                if !same_name(&found.recommended_name, &component.assessed_biomarker_entity.recommended_name) {
                    self.diagnostics.warn(
                        WarningKind::NameMismatch,
                        format!(
                            "Resource recommended name '{}' does not match assessed biomarker entity '{}'",
                            found.recommended_name, component.assessed_biomarker_entity.recommended_name
                        ),
                        Some(number),
                    );
                }
                component.assessed_biomarker_entity.synonyms = found
                    .synonyms
                    .into_iter()
                    .map(|synonym| Synonym { synonym })
                    .collect();
            }
            Ok(None) => self.diagnostics.warn(
                WarningKind::EnrichmentMiss,
                format!("No metadata found for {}", what),
                Some(number),
            ),
            Err(e) => self.diagnostics.warn(
                WarningKind::EnrichmentFailure,
                format!("Metadata lookup failed for {}: {}", what, e),
                Some(number),
            ),
        }
    }

    fn enrich_condition(&mut self, condition: &mut Condition, number: usize) {
        if !self.config.metadata {
            return;
        }
        let Some(id) = Identifier::parse(&condition.id) else {
            return;
        };
        if id.namespace_key() != "doid" {
            self.diagnostics.note_once(format!(
                "Condition name space '{}' not supported for description and synonym retrieval",
                id.namespace_key()
            ));
            return;
        }
        let Some(lookup) = self.lookup.as_deref_mut() else {
            return;
        };

        match lookup.lookup_condition(&id.accession) {
            Ok(Some(found)) => {
                let name = &condition.recommended_name;
                if found.recommended_name != name.name {
                    self.diagnostics.warn(
                        WarningKind::NameMismatch,
                        format!(
                            "Resource recommended name '{}' does not match condition '{}'",
                            found.recommended_name, name.name
                        ),
                        Some(number),
                    );
                }
                condition.synonyms = found
                    .synonyms
                    .into_iter()
                    .map(|synonym| ConditionSynonym {
                        id: condition.id.clone(),
                        name: synonym,
                        resource: name.resource.clone(),
                        url: name.url.clone(),
                    })
                    .collect();
                condition.recommended_name.description = found.description;
            }
            Ok(None) => self.diagnostics.warn(
                WarningKind::EnrichmentMiss,
                format!("No metadata found for condition {}", condition.id),
                Some(number),
            ),
            Err(e) => self.diagnostics.warn(
                WarningKind::EnrichmentFailure,
                format!("Metadata lookup failed for condition {}: {}", condition.id, e),
                Some(number),
            ),
        }
    }

    /// One citation per unique (record, evidence id), PubMed sources only.
    fn add_citations(&mut self) {
        let Some(lookup) = self.lookup.as_deref_mut() else {
            return;
        };

        let mut pending = 0usize;
        for record in &mut self.records {
            let mut seen = HashSet::new();
            let sources: Vec<_> = record
                .biomarker_component
                .iter()
                .flat_map(|c| c.evidence_source.iter())
                .chain(record.evidence_source.iter())
                .filter(|e| seen.insert((e.database.to_lowercase(), e.id.clone())))
                .map(|e| (e.database.clone(), e.id.clone(), e.url.clone()))
                .collect();

            for (database, id, url) in sources {
                if !database.eq_ignore_ascii_case("pubmed") {
                    self.diagnostics.note_once(format!(
                        "Evidence source database '{}' not supported for citation data",
                        database
                    ));
                    continue;
                }

                pending += 1;
                match lookup.lookup_citation(&id) {
                    Ok(Some(found)) => {
                        record.citation.push(Citation {
                            title: found.title,
                            journal: found.journal,
                            authors: found.authors,
                            date: found.publication_date,
                            evidence: Vec::new(),
                            reference: vec![Reference {
                                id,
                                reference_type: database,
                                url,
                            }],
                        });
                        self.summary.citations += 1;
                    }
                    Ok(None) => self.diagnostics.warn(
                        WarningKind::EnrichmentMiss,
                        format!("No citation found for {}:{}", database, id),
                        None,
                    ),
                    Err(e) => self.diagnostics.warn(
                        WarningKind::EnrichmentFailure,
                        format!("Citation lookup failed for {}:{}: {}", database, id, e),
                        None,
                    ),
                }
            }
        }

        tracing::info!(sources = pending, citations = self.summary.citations, "Citation data added");
    }
}

fn count_merge(summary: &mut RebuildSummary, outcome: EvidenceMerge) {
    match outcome {
        EvidenceMerge::Discarded => summary.duplicates += 1,
        EvidenceMerge::TagsMerged { added } => {
            tracing::debug!(added, "Unioned evidence tags");
            summary.tags_merged += 1;
        }
        EvidenceMerge::Appended => {}
    }
}

/// Names compared ignoring case, whitespace and punctuation.
fn same_name(a: &str, b: &str) -> bool {
    let clean = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    clean(a) == clean(b)
}
