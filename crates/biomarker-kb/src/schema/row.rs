//! The flattened row and its fixed column set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};

/// Column names in output order.
pub const COLUMNS: [&str; 16] = [
    "biomarker_id",
    "biomarker",
    "assessed_biomarker_entity",
    "assessed_biomarker_entity_id",
    "assessed_entity_type",
    "condition",
    "condition_id",
    "exposure_agent",
    "exposure_agent_id",
    "best_biomarker_role",
    "specimen",
    "specimen_id",
    "loinc_code",
    "evidence_source",
    "evidence",
    "tag",
];

/// Separator between role names in the `best_biomarker_role` column.
pub const ROLE_SEPARATOR: &str = ";";

/// Separator between tag tokens in the `tag` column.
pub const TAG_SEPARATOR: &str = ";";

/// Separator between evidence fragments in the `evidence` column.
///
/// Distinct from [`TAG_SEPARATOR`] because evidence text routinely contains
/// semicolons.
pub const EVIDENCE_SEPARATOR: &str = ";|";

/// One flattened fact: at most one (component, specimen, evidence source)
/// combination of a biomarker record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    pub biomarker_id: String,
    pub biomarker: String,
    pub assessed_biomarker_entity: String,
    pub assessed_biomarker_entity_id: String,
    pub assessed_entity_type: String,
    pub condition: String,
    pub condition_id: String,
    pub exposure_agent: String,
    pub exposure_agent_id: String,
    pub best_biomarker_role: String,
    pub specimen: String,
    pub specimen_id: String,
    pub loinc_code: String,
    pub evidence_source: String,
    pub evidence: String,
    pub tag: String,
}

impl Row {
    /// Trim surrounding whitespace from every cell.
    pub fn trimmed(mut self) -> Self {
        for cell in self.cells_mut() {
            let trimmed = cell.trim();
            if trimmed.len() != cell.len() {
                *cell = trimmed.to_string();
            }
        }
        self
    }

    /// Whether the row carries any evidence columns.
    pub fn has_evidence(&self) -> bool {
        !self.evidence_source.is_empty() || !self.evidence.is_empty() || !self.tag.is_empty()
    }

    /// Role names from the `best_biomarker_role` column.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        split_list(&self.best_biomarker_role, ROLE_SEPARATOR)
    }

    /// Evidence fragments from the `evidence` column.
    pub fn evidence_fragments(&self) -> impl Iterator<Item = &str> {
        split_list(&self.evidence, EVIDENCE_SEPARATOR)
    }

    /// Tag tokens from the `tag` column.
    pub fn tag_tokens(&self) -> impl Iterator<Item = &str> {
        split_list(&self.tag, TAG_SEPARATOR)
    }

    /// Cell values in column order.
    pub fn cells(&self) -> [&str; 16] {
        [
            &self.biomarker_id,
            &self.biomarker,
            &self.assessed_biomarker_entity,
            &self.assessed_biomarker_entity_id,
            &self.assessed_entity_type,
            &self.condition,
            &self.condition_id,
            &self.exposure_agent,
            &self.exposure_agent_id,
            &self.best_biomarker_role,
            &self.specimen,
            &self.specimen_id,
            &self.loinc_code,
            &self.evidence_source,
            &self.evidence,
            &self.tag,
        ]
    }

    fn cells_mut(&mut self) -> [&mut String; 16] {
        [
            &mut self.biomarker_id,
            &mut self.biomarker,
            &mut self.assessed_biomarker_entity,
            &mut self.assessed_biomarker_entity_id,
            &mut self.assessed_entity_type,
            &mut self.condition,
            &mut self.condition_id,
            &mut self.exposure_agent,
            &mut self.exposure_agent_id,
            &mut self.best_biomarker_role,
            &mut self.specimen,
            &mut self.specimen_id,
            &mut self.loinc_code,
            &mut self.evidence_source,
            &mut self.evidence,
            &mut self.tag,
        ]
    }
}

/// Split a delimited cell, trimming items and dropping empty ones.
fn split_list<'a>(value: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Validate a TSV header against the row schema.
///
/// Every header must be a known column and appear once, and every column
/// must be present. Column order is not significant.
pub fn validate_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();

    for header in headers {
        let header = header.trim();
        if !COLUMNS.contains(&header) {
            return Err(ConversionError::UnexpectedHeader(header.to_string()));
        }
        if !seen.insert(header) {
            return Err(ConversionError::DuplicateHeader(header.to_string()));
        }
    }

    if let Some(missing) = COLUMNS.iter().find(|c| !seen.contains(*c)) {
        return Err(ConversionError::MissingHeader(missing.to_string()));
    }

    Ok(())
}
