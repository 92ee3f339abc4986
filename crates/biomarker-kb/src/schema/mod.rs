//! Row schema and tag model for the tabular representation.

mod row;
mod tag;

pub use row::{validate_headers, Row, COLUMNS, EVIDENCE_SEPARATOR, ROLE_SEPARATOR, TAG_SEPARATOR};
pub use tag::{
    classify_tag, object_tag, resolve_row_tag, ObjectContext, ObjectField, RowTag, TagMatch,
    TagScope, COMPONENT_FIELDS, RECORD_FIELDS,
};
