//! Reading the two source formats.

mod document;
mod parser;

pub use document::{load_document, parse_document};
pub use parser::{read_rows, RowReader, DELIMITER, QUOTE};
