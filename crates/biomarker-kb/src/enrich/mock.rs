//! Mock metadata lookup for testing.

use std::collections::{HashMap, HashSet};

use crate::error::{ConversionError, Result};

use super::lookup::{CitationMetadata, ConditionMetadata, EntityMetadata, MetadataLookup};

/// Lookup that serves canned answers and counts calls.
///
/// Failure keys have the form `entity:<namespace>:<accession>`,
/// `condition:<doid>` or `citation:<pubmed id>`.
#[derive(Debug, Clone, Default)]
pub struct MockLookup {
    entities: HashMap<(String, String), EntityMetadata>,
    conditions: HashMap<String, ConditionMetadata>,
    citations: HashMap<String, CitationMetadata>,
    failing: HashSet<String>,
    entity_calls: usize,
    condition_calls: usize,
    citation_calls: usize,
    finished: bool,
}

impl MockLookup {
    /// Create a mock that misses on everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `namespace:accession` with `metadata`.
    pub fn with_entity(mut self, namespace: &str, accession: &str, metadata: EntityMetadata) -> Self {
        self.entities
            .insert((namespace.to_lowercase(), accession.to_string()), metadata);
        self
    }

    /// Answer a Disease Ontology accession with `metadata`.
    pub fn with_condition(mut self, doid: &str, metadata: ConditionMetadata) -> Self {
        self.conditions.insert(doid.to_string(), metadata);
        self
    }

    /// Answer a PubMed ID with `metadata`.
    pub fn with_citation(mut self, pubmed_id: &str, metadata: CitationMetadata) -> Self {
        self.citations.insert(pubmed_id.to_string(), metadata);
        self
    }

    /// Make the call identified by `key` return an error.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn entity_calls(&self) -> usize {
        self.entity_calls
    }

    pub fn condition_calls(&self) -> usize {
        self.condition_calls
    }

    pub fn citation_calls(&self) -> usize {
        self.citation_calls
    }

    /// Whether [`finish`](MetadataLookup::finish) was called.
    pub fn finished(&self) -> bool {
        self.finished
    }

    fn check(&self, key: String) -> Result<()> {
        if self.failing.contains(&key) {
            return Err(ConversionError::Lookup {
                key,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MetadataLookup for MockLookup {
    fn lookup(&mut self, namespace: &str, accession: &str) -> Result<Option<EntityMetadata>> {
        self.entity_calls += 1;
        let namespace = namespace.to_lowercase();
        self.check(format!("entity:{}:{}", namespace, accession))?;
        Ok(self
            .entities
            .get(&(namespace, accession.to_string()))
            .cloned())
    }

    fn lookup_condition(&mut self, doid: &str) -> Result<Option<ConditionMetadata>> {
        self.condition_calls += 1;
        self.check(format!("condition:{}", doid))?;
        Ok(self.conditions.get(doid).cloned())
    }

    fn lookup_citation(&mut self, pubmed_id: &str) -> Result<Option<CitationMetadata>> {
        self.citation_calls += 1;
        self.check(format!("citation:{}", pubmed_id))?;
        Ok(self.citations.get(pubmed_id).cloned())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_answers_and_counts() {
        let mut mock = MockLookup::new().with_entity(
            "UniProt",
            "P00533",
            EntityMetadata {
                recommended_name: "EGFR".to_string(),
                synonyms: Vec::new(),
            },
        );

        assert!(mock.lookup("uniprot", "P00533").unwrap().is_some());
        assert!(mock.lookup("uniprot", "P04637").unwrap().is_none());
        assert_eq!(mock.entity_calls(), 2);
    }

    #[test]
    fn test_mock_failure() {
        let mut mock = MockLookup::new().failing("citation:42");
        assert!(matches!(
            mock.lookup_citation("42"),
            Err(ConversionError::Lookup { .. })
        ));
        assert!(mock.lookup_citation("43").unwrap().is_none());
    }
}
