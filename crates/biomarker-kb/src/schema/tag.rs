//! Evidence tag model.
//!
//! A tag says which part of a record an evidence source supports. Singular
//! tags name a whole field (`biomarker`, `condition`, ...). Object tags have
//! the form `field:value` and only apply to rows whose specimen id or LOINC
//! code equals `value`.

use serde::{Deserialize, Serialize};

/// Singular tags that apply to a whole component.
pub const COMPONENT_FIELDS: [&str; 4] = [
    "biomarker",
    "assessed_biomarker_entity",
    "assessed_biomarker_entity_id",
    "assessed_entity_type",
];

/// Singular tags that apply to a whole record.
pub const RECORD_FIELDS: [&str; 3] = ["condition", "exposure_agent", "best_biomarker_role"];

/// Where a tag applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagScope {
    /// A singular component field.
    Component,
    /// A singular record field.
    Record,
    /// A specimen or LOINC code value.
    Object,
    /// Not a tag this schema knows.
    Unrecognized,
}

/// Fields that object tags can be keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectField {
    Specimen,
    LoincCode,
}

impl ObjectField {
    /// Parse the field part of an object tag.
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "specimen" => Some(ObjectField::Specimen),
            "loinc_code" => Some(ObjectField::LoincCode),
            _ => None,
        }
    }

    /// The field name as written in tags.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectField::Specimen => "specimen",
            ObjectField::LoincCode => "loinc_code",
        }
    }
}

/// The object-field values in effect for the row being processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectContext {
    /// Current specimen id (`namespace:accession`), empty when absent.
    pub specimen: String,
    /// Current LOINC code, empty when absent.
    pub loinc_code: String,
}

impl ObjectContext {
    pub fn new(specimen: impl Into<String>, loinc_code: impl Into<String>) -> Self {
        Self {
            specimen: specimen.into(),
            loinc_code: loinc_code.into(),
        }
    }

    /// Value of an object field in this context.
    pub fn get(&self, field: ObjectField) -> &str {
        match field {
            ObjectField::Specimen => &self.specimen,
            ObjectField::LoincCode => &self.loinc_code,
        }
    }
}

/// Result of classifying one tag token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagMatch {
    pub scope: TagScope,
    /// Whether the tag applies in the given object context.
    pub matches: bool,
}

impl TagMatch {
    fn new(scope: TagScope, matches: bool) -> Self {
        Self { scope, matches }
    }
}

/// Classify a tag token against the current object context.
///
/// Tokens without `:` are looked up in the singular field sets. Tokens of
/// the form `field:value` are object tags when `field` is `specimen` or
/// `loinc_code`, and match when `value` equals the context value. The split
/// is at the first `:` since values are themselves identifiers.
pub fn classify_tag(token: &str, context: &ObjectContext) -> TagMatch {
    let token = token.trim();

    match token.split_once(':') {
        None if COMPONENT_FIELDS.contains(&token) => TagMatch::new(TagScope::Component, true),
        None if RECORD_FIELDS.contains(&token) => TagMatch::new(TagScope::Record, true),
        None => TagMatch::new(TagScope::Unrecognized, false),
        Some((field, value)) => match ObjectField::parse(field) {
            Some(field) => TagMatch::new(TagScope::Object, value == context.get(field)),
            None => TagMatch::new(TagScope::Unrecognized, false),
        },
    }
}

/// Build the object tag token for a field and value.
pub fn object_tag(field: ObjectField, value: &str) -> String {
    format!("{}:{}", field.name(), value)
}

/// How a tag token from the `tag` column is interpreted when rebuilding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTag {
    /// Goes on the component-scoped evidence entry.
    Component(String),
    /// Goes on the record-scoped evidence entry.
    Record(String),
    /// An object tag naming a value other than the row's own.
    Unmatched(String),
    /// Not a known tag.
    Unrecognized(String),
}

/// Resolve a token read from a row's `tag` column.
///
/// Besides the forms [`classify_tag`] understands, a bare `specimen` or
/// `loinc_code` token is accepted as shorthand for the row's own value and
/// expanded to the full `field:value` form.
pub fn resolve_row_tag(token: &str, context: &ObjectContext) -> RowTag {
    let token = token.trim();

    if let Some(field) = ObjectField::parse(token) {
        return RowTag::Component(object_tag(field, context.get(field)));
    }

    let classified = classify_tag(token, context);
    match (classified.scope, classified.matches) {
        (TagScope::Component, _) | (TagScope::Object, true) => RowTag::Component(token.to_string()),
        (TagScope::Record, _) => RowTag::Record(token.to_string()),
        (TagScope::Object, false) => RowTag::Unmatched(token.to_string()),
        (TagScope::Unrecognized, _) => RowTag::Unrecognized(token.to_string()),
    }
}
