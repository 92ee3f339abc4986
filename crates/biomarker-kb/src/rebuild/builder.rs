//! Building document pieces from a single row.

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Location, Result};
use crate::model::{
    title_case, AssessedEntity, BiomarkerComponent, BiomarkerRole, Condition, EvidenceSource,
    EvidenceTag, EvidenceText, ExposureAgent, Identifier, RecommendedName, Specimen,
};
use crate::report::{Diagnostics, WarningKind};
use crate::schema::{resolve_row_tag, ObjectContext, Row, RowTag};

/// Tags of one row, split by the evidence entry they belong to.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RowTags {
    pub component: Vec<EvidenceTag>,
    pub record: Vec<EvidenceTag>,
}

/// Builds candidate document pieces from one (trimmed) row.
pub struct RowBuilder<'a> {
    number: usize,
    row: &'a Row,
    config: &'a ConversionConfig,
}

impl<'a> RowBuilder<'a> {
    pub fn new(number: usize, row: &'a Row, config: &'a ConversionConfig) -> Self {
        Self {
            number,
            row,
            config,
        }
    }

    fn location(&self) -> Location {
        Location::Row(self.number)
    }

    /// Check required columns and return the parsed entity identifier.
    pub fn validate(&self) -> Result<Identifier> {
        let row = self.row;
        let required = [
            ("biomarker_id", &row.biomarker_id),
            ("biomarker", &row.biomarker),
            ("assessed_biomarker_entity", &row.assessed_biomarker_entity),
            ("assessed_biomarker_entity_id", &row.assessed_biomarker_entity_id),
            ("assessed_entity_type", &row.assessed_entity_type),
        ];
        if let Some((column, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConversionError::missing(self.location(), *column));
        }

        let id = &self.row.assessed_biomarker_entity_id;
        Identifier::parse(id).ok_or_else(|| ConversionError::InvalidIdentifier {
            location: self.location(),
            field: "assessed_biomarker_entity_id".to_string(),
            value: id.clone(),
        })
    }

    /// Split the `tag` column into component and record tags.
    ///
    /// Unknown tokens and object tags for another specimen are dropped with a
    /// warning.
    pub fn tags(&self, diagnostics: &mut Diagnostics) -> RowTags {
        let context = ObjectContext::new(self.row.specimen_id.clone(), self.row.loinc_code.clone());
        let mut tags = RowTags::default();

        for token in self.row.tag_tokens() {
            match resolve_row_tag(token, &context) {
                RowTag::Component(tag) => push_unique(&mut tags.component, tag),
                RowTag::Record(tag) => push_unique(&mut tags.record, tag),
                RowTag::Unmatched(tag) => diagnostics.warn(
                    WarningKind::UnmatchedObjectTag,
                    format!(
                        "Tag '{}' does not match the specimen/LOINC code of its row for biomarker {}",
                        tag, self.row.biomarker_id
                    ),
                    Some(self.number),
                ),
                RowTag::Unrecognized(tag) => diagnostics.warn(
                    WarningKind::UnrecognizedTag,
                    format!("Unrecognized tag '{}' for biomarker {}", tag, self.row.biomarker_id),
                    Some(self.number),
                ),
            }
        }

        tags
    }

    /// An evidence entry carrying `tags`, or `None` when there are no tags.
    pub fn evidence(
        &self,
        tags: Vec<EvidenceTag>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<EvidenceSource>> {
        if tags.is_empty() {
            return Ok(None);
        }

        let source = &self.row.evidence_source;
        if source.is_empty() {
            return Err(ConversionError::missing(self.location(), "evidence_source"));
        }
        let (database, id) = match source.split_once(':') {
            Some((database, id)) if !database.trim().is_empty() && !id.trim().is_empty() => {
                (database.trim(), id.trim())
            }
            _ => {
                return Err(ConversionError::InvalidIdentifier {
                    location: self.location(),
                    field: "evidence_source".to_string(),
                    value: source.clone(),
                })
            }
        };

        let identifier = Identifier {
            namespace: database.to_string(),
            accession: id.to_string(),
        };
        let url = self.resolve_url(&identifier, "Evidence database", diagnostics);

        Ok(Some(EvidenceSource {
            id: id.to_string(),
            database: database.to_string(),
            url,
            evidence_list: self
                .row
                .evidence_fragments()
                .map(|fragment| EvidenceText::new(fragment.trim()))
                .collect(),
            tags,
        }))
    }

    /// A specimen when the row has a specimen or LOINC code.
    pub fn specimen(&self, diagnostics: &mut Diagnostics) -> Option<Specimen> {
        let row = self.row;
        if row.specimen.is_empty() && row.specimen_id.is_empty() && row.loinc_code.is_empty() {
            return None;
        }

        let (name_space, url) = match Identifier::parse(&row.specimen_id) {
            Some(id) => {
                let url = self.resolve_url(&id, "Specimen", diagnostics);
                (title_case(&id.namespace), url.unwrap_or_default())
            }
            None => (String::new(), String::new()),
        };

        Some(Specimen {
            name: row.specimen.clone(),
            id: row.specimen_id.clone(),
            name_space,
            url,
            loinc_code: row.loinc_code.clone(),
        })
    }

    /// The component described by the row's entity columns, without
    /// specimens or evidence.
    pub fn component(&self) -> BiomarkerComponent {
        BiomarkerComponent {
            biomarker: self.row.biomarker.clone(),
            assessed_biomarker_entity: AssessedEntity::new(self.row.assessed_biomarker_entity.clone()),
            assessed_biomarker_entity_id: self.row.assessed_biomarker_entity_id.clone(),
            assessed_entity_type: self.row.assessed_entity_type.clone(),
            specimen: Vec::new(),
            evidence_source: Vec::new(),
        }
    }

    /// Role list from the `best_biomarker_role` column.
    pub fn roles(&self) -> Vec<BiomarkerRole> {
        self.row.roles().map(BiomarkerRole::new).collect()
    }

    /// The condition entry, if the row names one.
    pub fn condition(&self, diagnostics: &mut Diagnostics) -> Result<Option<Condition>> {
        let Some(recommended_name) =
            self.named_term(&self.row.condition, &self.row.condition_id, "condition_id", diagnostics)?
        else {
            return Ok(None);
        };

        Ok(Some(Condition {
            id: self.row.condition_id.clone(),
            recommended_name,
            synonyms: Vec::new(),
        }))
    }

    /// The exposure agent entry, if the row names one.
    pub fn exposure_agent(&self, diagnostics: &mut Diagnostics) -> Result<Option<ExposureAgent>> {
        let Some(recommended_name) = self.named_term(
            &self.row.exposure_agent,
            &self.row.exposure_agent_id,
            "exposure_agent_id",
            diagnostics,
        )?
        else {
            return Ok(None);
        };

        Ok(Some(ExposureAgent {
            id: self.row.exposure_agent_id.clone(),
            recommended_name,
        }))
    }

    /// Recommended name for a name/id column pair; `None` when both are empty.
    fn named_term(
        &self,
        name: &str,
        id: &str,
        id_field: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<RecommendedName>> {
        if name.is_empty() && id.is_empty() {
            return Ok(None);
        }
        if id.is_empty() {
            return Err(ConversionError::missing(self.location(), id_field));
        }

        let identifier = Identifier::parse(id).ok_or_else(|| ConversionError::InvalidIdentifier {
            location: self.location(),
            field: id_field.to_string(),
            value: id.to_string(),
        })?;

        if !self
            .config
            .name_space_map
            .contains_key(&identifier.namespace_key())
        {
            diagnostics.note_once(format!(
                "Name space '{}' not in the name space map",
                identifier.namespace_key()
            ));
        }
        let url = self.resolve_url(&identifier, "Term", diagnostics);

        Ok(Some(RecommendedName {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            resource: self.config.resource_name(&identifier),
            url,
        }))
    }

    fn resolve_url(
        &self,
        id: &Identifier,
        what: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        let url = self.config.url_for(id);
        if url.is_none() {
            diagnostics.warn(
                WarningKind::UnknownNamespace,
                format!("{} namespace '{}' not in the URL map", what, id.namespace_key()),
                Some(self.number),
            );
        }
        url
    }
}

fn push_unique(tags: &mut Vec<EvidenceTag>, tag: String) {
    if !tags.iter().any(|t| t.tag == tag) {
        tags.push(EvidenceTag::new(tag));
    }
}
