//! Metadata lookup trait and result types.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Names for an assessed biomarker entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// The resource's preferred name.
    pub recommended_name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Description and synonyms for a condition term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionMetadata {
    pub recommended_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Bibliographic data for a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetadata {
    pub title: String,
    pub journal: String,
    pub authors: String,
    pub publication_date: String,
}

/// Source of synonym, condition and citation metadata.
///
/// `Ok(None)` is a miss: the identifier is unknown to the resource. `Err` is
/// a failed lookup. Neither aborts a conversion; the rebuild leaves the
/// affected fields empty and records a warning.
pub trait MetadataLookup {
    /// Recommended name and synonyms for `namespace:accession`.
    ///
    /// `namespace` is passed lowercase (`uniprot`, `chebi`, `cl`, ...).
    fn lookup(&mut self, namespace: &str, accession: &str) -> Result<Option<EntityMetadata>>;

    /// Description and synonyms for a Disease Ontology accession.
    fn lookup_condition(&mut self, doid: &str) -> Result<Option<ConditionMetadata>>;

    /// Citation data for a PubMed ID.
    fn lookup_citation(&mut self, pubmed_id: &str) -> Result<Option<CitationMetadata>>;

    /// Called once after the run so implementations can persist state.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: MetadataLookup + ?Sized> MetadataLookup for Box<T> {
    fn lookup(&mut self, namespace: &str, accession: &str) -> Result<Option<EntityMetadata>> {
        (**self).lookup(namespace, accession)
    }

    fn lookup_condition(&mut self, doid: &str) -> Result<Option<ConditionMetadata>> {
        (**self).lookup_condition(doid)
    }

    fn lookup_citation(&mut self, pubmed_id: &str) -> Result<Option<CitationMetadata>> {
        (**self).lookup_citation(pubmed_id)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// A lookup with no backing resource; every call is a miss.
///
/// Wrapped in a [`CachedLookup`](super::CachedLookup) it serves whatever a
/// previously filled cache file holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLookup;

impl MetadataLookup for OfflineLookup {
    fn lookup(&mut self, _namespace: &str, _accession: &str) -> Result<Option<EntityMetadata>> {
        Ok(None)
    }

    fn lookup_condition(&mut self, _doid: &str) -> Result<Option<ConditionMetadata>> {
        Ok(None)
    }

    fn lookup_citation(&mut self, _pubmed_id: &str) -> Result<Option<CitationMetadata>> {
        Ok(None)
    }
}
