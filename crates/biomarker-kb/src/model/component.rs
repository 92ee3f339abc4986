//! Biomarker components and specimens.

use serde::{Deserialize, Serialize};

use super::evidence::EvidenceSource;

/// One assessed-entity-level unit of a biomarker record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerComponent {
    /// Free-text description of the measured change.
    pub biomarker: String,
    /// The entity being measured.
    pub assessed_biomarker_entity: AssessedEntity,
    /// `namespace:accession` of the assessed entity.
    pub assessed_biomarker_entity_id: String,
    /// Entity type (gene, protein, metabolite, ...).
    pub assessed_entity_type: String,
    /// Specimens the biomarker is measured in.
    #[serde(default)]
    pub specimen: Vec<Specimen>,
    /// Component-scoped evidence.
    pub evidence_source: Vec<EvidenceSource>,
}

impl BiomarkerComponent {
    /// The identity used when merging rows into an existing record.
    pub fn key(&self) -> ComponentKey<'_> {
        ComponentKey {
            biomarker: &self.biomarker,
            recommended_name: &self.assessed_biomarker_entity.recommended_name,
            entity_id: &self.assessed_biomarker_entity_id,
            entity_type: &self.assessed_entity_type,
        }
    }

    /// Whether a specimen with the same key is already listed.
    pub fn has_specimen(&self, candidate: &Specimen) -> bool {
        let key = candidate.key();
        self.specimen.iter().any(|s| s.key() == key)
    }
}

/// Component identity: no two components of one record may share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentKey<'a> {
    pub biomarker: &'a str,
    pub recommended_name: &'a str,
    pub entity_id: &'a str,
    pub entity_type: &'a str,
}

/// The assessed entity's name and synonyms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessedEntity {
    pub recommended_name: String,
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
}

impl AssessedEntity {
    /// Create an entity with no synonyms.
    pub fn new(recommended_name: impl Into<String>) -> Self {
        Self {
            recommended_name: recommended_name.into(),
            synonyms: Vec::new(),
        }
    }
}

/// An alternative name for an assessed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub synonym: String,
}

/// A biological sample type associated with a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specimen {
    #[serde(default)]
    pub name: String,
    /// `namespace:accession` of the specimen term.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name_space: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub loinc_code: String,
}

impl Specimen {
    /// The identity used for specimen deduplication within a component.
    pub fn key(&self) -> SpecimenKey<'_> {
        SpecimenKey {
            name: &self.name,
            id: &self.id,
            loinc_code: &self.loinc_code,
        }
    }
}

/// Specimen identity: one specimen per (name, id, loinc_code) per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecimenKey<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub loinc_code: &'a str,
}
