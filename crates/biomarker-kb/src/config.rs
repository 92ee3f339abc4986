//! Conversion configuration.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, Result};
use crate::model::{title_case, Identifier};

/// Default flush/log checkpoint, in rows.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Configuration shared by both conversion directions.
///
/// Every field has a default, so a config file only needs to list what it
/// overrides:
///
/// ```json
/// { "chunk_size": 500, "url_map": { "uberon": "http://purl.obolibrary.org/obo/UBERON_" } }
/// ```
///
/// Map entries from a file are merged over the built-in maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Rows buffered before the flatten engine flushes, and rows between
    /// rebuild progress checkpoints.
    pub chunk_size: usize,
    /// Log an info event at each checkpoint.
    pub log_checkpoints: bool,
    /// Call the metadata lookup while rebuilding.
    pub metadata: bool,
    /// Lowercase namespace -> base URL; URLs are `base + accession`.
    pub url_map: BTreeMap<String, String>,
    /// Lowercase namespace -> full resource name.
    pub name_space_map: BTreeMap<String, String>,
    /// Maximum uncached lookups per second (None = unlimited).
    pub requests_per_second: Option<f64>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_checkpoints: false,
            metadata: false,
            url_map: default_url_map(),
            name_space_map: default_name_space_map(),
            requests_per_second: None,
        }
    }
}

impl ConversionConfig {
    /// Load a configuration file, layering it over the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConversionError::io(path, e))?;

        let overrides: ConversionConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                ConversionError::Config(format!("Failed to parse '{}': {}", path.display(), e))
            })?;

        let mut config = Self::default();
        config.chunk_size = overrides.chunk_size;
        config.log_checkpoints = overrides.log_checkpoints;
        config.metadata = overrides.metadata;
        config.requests_per_second = overrides.requests_per_second;
        config.url_map.extend(overrides.url_map);
        config.name_space_map.extend(overrides.name_space_map);
        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ConversionError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if let Some(rate) = self.requests_per_second {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(ConversionError::Config(format!(
                    "requests_per_second must be a positive number, got {}",
                    rate
                )));
            }
        }
        Ok(())
    }

    /// Set the checkpoint size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Enable or disable metadata lookups.
    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /// Resolve the URL for an identifier, if its namespace has a base URL.
    pub fn url_for(&self, id: &Identifier) -> Option<String> {
        self.url_map
            .get(&id.namespace_key())
            .map(|base| format!("{}{}", base, id.accession))
    }

    /// Display name of a namespace's resource.
    ///
    /// Falls back to the namespace as written when it is not in the map.
    pub fn resource_name(&self, id: &Identifier) -> String {
        match self.name_space_map.get(&id.namespace_key()) {
            Some(name) => title_case(name),
            None => id.namespace.clone(),
        }
    }
}

fn default_url_map() -> BTreeMap<String, String> {
    [
        ("uberon", "http://purl.obolibrary.org/obo/UBERON_"),
        ("cl", "http://purl.obolibrary.org/obo/CL_"),
        ("doid", "https://disease-ontology.org/?id=DOID:"),
        ("pubmed", "https://pubmed.ncbi.nlm.nih.gov/"),
        ("uniprot", "https://www.uniprot.org/uniprotkb/"),
        ("upkb", "https://www.uniprot.org/uniprotkb/"),
        ("chebi", "https://www.ebi.ac.uk/chebi/searchId.do?chebiId=CHEBI:"),
        ("hgnc", "https://www.genenames.org/data/gene-symbol-report/#!/hgnc_id/HGNC:"),
        ("ncbi", "https://www.ncbi.nlm.nih.gov/gene/"),
        ("loinc", "https://loinc.org/"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_name_space_map() -> BTreeMap<String, String> {
    [
        ("uberon", "uberon"),
        ("cl", "cell ontology"),
        ("doid", "disease ontology"),
        ("pubmed", "pubmed"),
        ("uniprot", "uniprot"),
        ("upkb", "uniprot"),
        ("chebi", "chebi"),
        ("hgnc", "hgnc"),
        ("ncbi", "ncbi"),
        ("loinc", "loinc"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
