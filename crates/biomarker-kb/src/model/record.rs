//! Top-level biomarker records.

use serde::{Deserialize, Serialize};

use super::component::BiomarkerComponent;
use super::evidence::{Citation, EvidenceSource};

/// One biomarker entry, keyed by `biomarker_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerRecord {
    /// Primary key, unique within a document.
    pub biomarker_id: String,
    pub biomarker_component: Vec<BiomarkerComponent>,
    pub best_biomarker_role: Vec<BiomarkerRole>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_agent: Option<ExposureAgent>,
    /// Record-scoped evidence.
    #[serde(default)]
    pub evidence_source: Vec<EvidenceSource>,
    #[serde(default)]
    pub citation: Vec<Citation>,
}

impl BiomarkerRecord {
    /// Role names in declaration order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.best_biomarker_role.iter().map(|r| r.role.as_str())
    }

    /// Condition (name, id), empty strings when there is no condition.
    pub fn condition_columns(&self) -> (&str, &str) {
        match &self.condition {
            Some(c) => (c.recommended_name.name.as_str(), c.id.as_str()),
            None => ("", ""),
        }
    }

    /// Exposure agent (name, id), empty strings when there is none.
    pub fn exposure_agent_columns(&self) -> (&str, &str) {
        match &self.exposure_agent {
            Some(e) => (e.recommended_name.name.as_str(), e.id.as_str()),
            None => ("", ""),
        }
    }
}

/// A best-biomarker role name (diagnostic, prognostic, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomarkerRole {
    pub role: String,
}

impl BiomarkerRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

/// The condition a biomarker is associated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// `namespace:accession` of the condition term.
    #[serde(alias = "condition_id")]
    pub id: String,
    pub recommended_name: RecommendedName,
    #[serde(default)]
    pub synonyms: Vec<ConditionSynonym>,
}

/// The exposure agent a biomarker is associated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureAgent {
    #[serde(alias = "exposure_agent_id")]
    pub id: String,
    pub recommended_name: RecommendedName,
}

/// Preferred name of a condition or exposure agent, with its resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedName {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// An alternative name for a condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSynonym {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub url: Option<String>,
}
