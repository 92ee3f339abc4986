//! Evidence sources, tags and citations.

use serde::{Deserialize, Serialize};

/// A reference plus the text it supports, scoped by tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSource {
    /// Accession within the database (e.g. a PubMed ID).
    pub id: String,
    /// Source database name.
    pub database: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Evidence text fragments, in order.
    #[serde(default)]
    pub evidence_list: Vec<EvidenceText>,
    /// Scoping tags controlling which rows the evidence applies to.
    #[serde(default)]
    pub tags: Vec<EvidenceTag>,
}

impl EvidenceSource {
    /// Whether two sources are the same evidence, ignoring tags.
    pub fn same_evidence(&self, other: &EvidenceSource) -> bool {
        self.id == other.id
            && self.database == other.database
            && self.url == other.url
            && self.evidence_list == other.evidence_list
    }

    /// The value written to the `evidence_source` column (`database:id`).
    pub fn source_label(&self) -> String {
        format!("{}:{}", self.database, self.id)
    }

    /// The evidence fragments joined with `separator`.
    pub fn joined_text(&self, separator: &str) -> String {
        self.evidence_list
            .iter()
            .map(|e| e.evidence.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Iterate over the raw tag tokens.
    pub fn tag_tokens(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.tag.as_str())
    }

    /// Whether this source carries the given tag token.
    pub fn has_tag(&self, token: &str) -> bool {
        self.tags.iter().any(|t| t.tag == token)
    }

    /// Append every tag from `other` not already present.
    ///
    /// Returns the number of tags added.
    pub fn union_tags(&mut self, other: &[EvidenceTag]) -> usize {
        let mut added = 0;
        for tag in other {
            if !self.has_tag(&tag.tag) {
                self.tags.push(tag.clone());
                added += 1;
            }
        }
        added
    }
}

/// One evidence text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceText {
    pub evidence: String,
}

impl EvidenceText {
    pub fn new(evidence: impl Into<String>) -> Self {
        Self {
            evidence: evidence.into(),
        }
    }
}

/// A scoping token on an evidence source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceTag {
    pub tag: String,
}

impl EvidenceTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Bibliographic data for an evidence source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub journal: String,
    pub authors: String,
    pub date: String,
    #[serde(default)]
    pub evidence: Vec<EvidenceText>,
    #[serde(default)]
    pub reference: Vec<Reference>,
}

/// Pointer from a citation back to its evidence source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub reference_type: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tags: &[&str]) -> EvidenceSource {
        EvidenceSource {
            id: "29214994".to_string(),
            database: "PubMed".to_string(),
            url: Some("https://pubmed.ncbi.nlm.nih.gov/29214994".to_string()),
            evidence_list: vec![
                EvidenceText::new("elevated in blood"),
                EvidenceText::new("n=42"),
            ],
            tags: tags.iter().map(|t| EvidenceTag::new(*t)).collect(),
        }
    }

    #[test]
    fn test_same_evidence_ignores_tags() {
        let a = source(&["biomarker"]);
        let b = source(&["condition"]);
        assert!(a.same_evidence(&b));
        assert_ne!(a, b);

        let mut c = source(&["biomarker"]);
        c.evidence_list.pop();
        assert!(!a.same_evidence(&c));
    }

    #[test]
    fn test_union_tags_preserves_order() {
        let mut a = source(&["biomarker", "specimen:UBERON:0000178"]);
        let b = source(&["condition", "biomarker"]);
        assert_eq!(a.union_tags(&b.tags), 1);
        let tags: Vec<&str> = a.tag_tokens().collect();
        assert_eq!(tags, vec!["biomarker", "specimen:UBERON:0000178", "condition"]);
    }

    #[test]
    fn test_joined_text_and_label() {
        let a = source(&[]);
        assert_eq!(a.joined_text(";|"), "elevated in blood;|n=42");
        assert_eq!(a.source_label(), "PubMed:29214994");
    }

    #[test]
    fn test_reference_type_field_name() {
        let reference = Reference {
            id: "29214994".to_string(),
            reference_type: "Pubmed".to_string(),
            url: None,
        };
        let json = serde_json::to_value(&reference).unwrap();
        assert_eq!(json["type"], "Pubmed");
    }
}
