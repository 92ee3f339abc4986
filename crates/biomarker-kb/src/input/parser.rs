//! TSV row reader with header validation.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{ConversionError, Result};
use crate::schema::{validate_headers, Row};

/// Field delimiter of the table format.
pub const DELIMITER: u8 = b'\t';

/// Quote character of the table format.
pub const QUOTE: u8 = b'"';

/// Streams [`Row`]s out of a TSV source.
///
/// The header is validated when the reader is created, so a table with an
/// unknown, missing or duplicated column fails before any row is returned.
pub struct RowReader<R: Read> {
    reader: csv::Reader<R>,
}

impl RowReader<BufReader<File>> {
    /// Open a TSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConversionError::io(path, e))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> RowReader<R> {
    /// Wrap a reader and validate its header row.
    pub fn new(source: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .quote(QUOTE)
            .has_headers(true)
            .from_reader(source);

        let headers = reader.headers()?;
        validate_headers(headers.iter())?;

        Ok(Self { reader })
    }

    /// Iterate over trimmed rows paired with their 1-based row number.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<(usize, Row)>> + '_ {
        self.reader
            .deserialize::<Row>()
            .enumerate()
            .map(|(idx, result)| {
                result
                    .map(|row| (idx + 1, row.trimmed()))
                    .map_err(ConversionError::from)
            })
    }
}

/// Read every row of a TSV source into memory.
pub fn read_rows<R: Read>(source: R) -> Result<Vec<Row>> {
    let mut reader = RowReader::new(source)?;
    reader.rows().map(|r| r.map(|(_, row)| row)).collect()
}
