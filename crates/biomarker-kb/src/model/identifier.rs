//! `namespace:accession` identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Namespace prefixes are a letter followed by word characters, dots or dashes.
static NAMESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").expect("valid namespace regex"));

/// A resource identifier of the form `namespace:accession`.
///
/// The split happens at the first `:` so accessions that contain colons
/// (e.g. `DOID:DOID:1234` style legacy values) keep them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// Namespace exactly as written (e.g. "UBERON").
    pub namespace: String,
    /// Accession within the namespace (e.g. "0000178").
    pub accession: String,
}

impl Identifier {
    /// Parse a `namespace:accession` string.
    ///
    /// Returns `None` when there is no colon, the namespace is not a valid
    /// prefix, or the accession is empty.
    pub fn parse(value: &str) -> Option<Self> {
        let (namespace, accession) = value.trim().split_once(':')?;
        let namespace = namespace.trim();
        let accession = accession.trim();

        if accession.is_empty() || !NAMESPACE_PATTERN.is_match(namespace) {
            return None;
        }

        Some(Self {
            namespace: namespace.to_string(),
            accession: accession.to_string(),
        })
    }

    /// Lowercase namespace, the form used as key in the URL and name space maps.
    pub fn namespace_key(&self) -> String {
        self.namespace.to_lowercase()
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.accession)
    }
}

/// Capitalize the first letter of every word and lowercase the rest.
///
/// Used for resource and namespace display names ("disease ontology" ->
/// "Disease Ontology", "uberon" -> "Uberon").
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut at_word_start = true;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                result.extend(ch.to_uppercase());
            } else {
                result.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(ch);
            at_word_start = true;
        }
    }

    result
}
