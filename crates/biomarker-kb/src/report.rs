//! Conversion reports and non-fatal warnings.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ConversionError, Result};

/// Metadata about the source file of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// When the conversion started.
    pub converted_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Hash and describe a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConversionError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let mut hasher = Sha256::new();
        let mut buf = [0u8; 64 * 1024];
        let mut size_bytes = 0u64;
        loop {
            let n = reader.read(&mut buf).map_err(|e| ConversionError::io(path, e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            size_bytes += n as u64;
        }

        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            file,
            path: path.to_path_buf(),
            hash: format!("sha256:{:x}", hasher.finalize()),
            size_bytes,
            converted_at: Utc::now(),
        })
    }
}

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Document -> rows.
    Flatten,
    /// Rows -> document.
    Rebuild,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Flatten => write!(f, "JSON -> TSV"),
            Direction::Rebuild => write!(f, "TSV -> JSON"),
        }
    }
}

/// Kind of non-fatal problem found during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A tag token outside the tag model.
    UnrecognizedTag,
    /// An object tag naming a specimen/LOINC value other than the row's.
    UnmatchedObjectTag,
    /// A namespace missing from the URL or name space map.
    UnknownNamespace,
    /// Lookup found nothing for an identifier.
    EnrichmentMiss,
    /// Lookup failed (network, parse, ...).
    EnrichmentFailure,
    /// Looked up recommended name differs from the table value.
    NameMismatch,
    /// A later row disagrees with record-level values set by an earlier row.
    ConflictingRecordField,
}

impl WarningKind {
    /// Get a human-readable label for the warning kind.
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::UnrecognizedTag => "Unrecognized tag",
            WarningKind::UnmatchedObjectTag => "Unmatched object tag",
            WarningKind::UnknownNamespace => "Unknown namespace",
            WarningKind::EnrichmentMiss => "Enrichment miss",
            WarningKind::EnrichmentFailure => "Enrichment failure",
            WarningKind::NameMismatch => "Name mismatch",
            WarningKind::ConflictingRecordField => "Conflicting record field",
        }
    }
}

/// A recorded non-fatal problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionWarning {
    pub kind: WarningKind,
    pub message: String,
    /// Entry index (flatten) or 1-based row number (rebuild), when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
}

/// Collects warnings for a run, logging each distinct message once.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<ConversionWarning>,
    logged: HashSet<(WarningKind, String)>,
    noted: HashSet<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning. The log event is emitted only the first time a
    /// given kind/message pair is seen; every occurrence is kept.
    pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>, location: Option<usize>) {
        let message = message.into();
        if self.logged.insert((kind, message.clone())) {
            match location {
                Some(at) => tracing::warn!(kind = kind.label(), location = at, "{}", message),
                None => tracing::warn!(kind = kind.label(), "{}", message),
            }
        }
        self.warnings.push(ConversionWarning {
            kind,
            message,
            location,
        });
    }

    /// Log an informational message once per run without recording it.
    pub fn note_once(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.noted.insert(message.clone()) {
            tracing::info!("{}", message);
        }
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    /// Consume into the recorded warnings.
    pub fn into_warnings(self) -> Vec<ConversionWarning> {
        self.warnings
    }
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub source: SourceMetadata,
    pub target: PathBuf,
    pub direction: Direction,
    /// Biomarker records read (flatten) or written (rebuild).
    pub records: usize,
    /// Rows written (flatten) or read (rebuild).
    pub rows: usize,
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionReport {
    /// Warning counts grouped by kind.
    pub fn warning_counts(&self) -> HashMap<WarningKind, usize> {
        let mut counts = HashMap::new();
        for warning in &self.warnings {
            *counts.entry(warning.kind).or_insert(0) += 1;
        }
        counts
    }
}
