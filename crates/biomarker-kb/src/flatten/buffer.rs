//! Append-only row buffer with an evidence index for tag splicing.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::schema::{classify_tag, ObjectContext, Row, TAG_SEPARATOR};

/// Identity of an emitted evidence row within one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvidenceKey {
    pub biomarker_id: String,
    /// `database:id` of the evidence source.
    pub source: String,
    /// Evidence fragments joined with the evidence separator.
    pub text: String,
}

impl EvidenceKey {
    pub fn new(
        biomarker_id: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            biomarker_id: biomarker_id.into(),
            source: source.into(),
            text: text.into(),
        }
    }
}

/// What happened when tags were offered to an already-emitted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// A buffered row already carries every offered tag.
    Duplicate,
    /// The missing tags were appended to a buffered row.
    Spliced { added: usize },
    /// No row with this key is buffered (never emitted, or already flushed).
    NotBuffered,
    /// Rows with this key are buffered, but none has the specimen/LOINC
    /// value every offered object tag names.
    OutOfScope,
}

/// Rows emitted since the last flush.
///
/// The index only covers buffered rows. Once rows are drained, their tags
/// can no longer be extended.
#[derive(Debug, Default)]
pub struct RowBuffer {
    rows: Vec<Row>,
    index: HashMap<EvidenceKey, Vec<usize>>,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row without indexing it.
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Append an evidence row and index it under `key`.
    pub fn push_evidence(&mut self, key: EvidenceKey, row: Row) {
        let handle = self.rows.len();
        self.rows.push(row);
        self.index.entry(key).or_default().push(handle);
    }

    /// Offer tags to the buffered rows carrying `key`.
    ///
    /// If any such row already has all the tags this is a duplicate.
    /// Otherwise the missing tags are appended to the earliest such row in
    /// whose context every offered tag applies, so an object tag never lands
    /// on a row for another specimen or LOINC code.
    pub fn splice_tags(&mut self, key: &EvidenceKey, tags: &IndexSet<String>) -> SpliceOutcome {
        let Some(handles) = self.index.get(key) else {
            return SpliceOutcome::NotBuffered;
        };

        let covered = handles.iter().any(|&h| {
            let existing = tag_set(&self.rows[h].tag);
            tags.iter().all(|t| existing.contains(t.as_str()))
        });
        if covered {
            return SpliceOutcome::Duplicate;
        }

        let target = handles
            .iter()
            .copied()
            .find(|&h| in_scope(&self.rows[h], tags));
        let Some(target) = target else {
            return if handles.is_empty() {
                SpliceOutcome::NotBuffered
            } else {
                SpliceOutcome::OutOfScope
            };
        };

        let row = &mut self.rows[target];
        let existing: IndexSet<String> = tag_set(&row.tag).into_iter().map(str::to_string).collect();
        let missing: Vec<&str> = tags
            .iter()
            .filter(|t| !existing.contains(t.as_str()))
            .map(String::as_str)
            .collect();

        if row.tag.is_empty() {
            row.tag = missing.join(TAG_SEPARATOR);
        } else {
            row.tag = format!("{}{}{}", row.tag, TAG_SEPARATOR, missing.join(TAG_SEPARATOR));
        }

        SpliceOutcome::Spliced {
            added: missing.len(),
        }
    }

    /// Number of buffered rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take every buffered row, clearing the index.
    pub fn drain(&mut self) -> Vec<Row> {
        self.index.clear();
        std::mem::take(&mut self.rows)
    }
}

/// Whether every tag applies in the row's own specimen/LOINC context.
fn in_scope(row: &Row, tags: &IndexSet<String>) -> bool {
    let context = ObjectContext::new(row.specimen_id.clone(), row.loinc_code.clone());
    tags.iter().all(|t| classify_tag(t, &context).matches)
}

fn tag_set(column: &str) -> IndexSet<&str> {
    column
        .split(TAG_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
