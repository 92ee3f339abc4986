//! Biomarker document model.
//!
//! One [`BiomarkerRecord`] per biomarker, holding its components, specimens,
//! condition and evidence. The field names match the JSON data model exactly,
//! so the structs serialize straight to and from the document format.

mod component;
mod evidence;
mod identifier;
mod record;

pub use component::{AssessedEntity, BiomarkerComponent, ComponentKey, Specimen, SpecimenKey, Synonym};
pub use evidence::{Citation, EvidenceSource, EvidenceTag, EvidenceText, Reference};
pub use identifier::{title_case, Identifier};
pub use record::{
    BiomarkerRecord, BiomarkerRole, Condition, ConditionSynonym, ExposureAgent, RecommendedName,
};
