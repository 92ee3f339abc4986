//! JSON document loading.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde_json::Value;

use crate::error::{ConversionError, Result};
use crate::model::BiomarkerRecord;

/// Parse a document (a JSON array of biomarker records).
///
/// Entries are decoded one at a time so a malformed entry is reported with
/// its index in the array.
pub fn parse_document<R: Read>(source: R) -> Result<Vec<BiomarkerRecord>> {
    let entries: Vec<Value> = serde_json::from_reader(source)?;

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry).map_err(|e| ConversionError::InvalidEntry {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Load a document from a file.
pub fn load_document(path: impl AsRef<Path>) -> Result<Vec<BiomarkerRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ConversionError::io(path, e))?;
    parse_document(BufReader::new(file))
}
