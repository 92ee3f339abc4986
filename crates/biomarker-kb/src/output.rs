//! All-or-nothing output files.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{ConversionError, Result};

/// A target file that only appears once the conversion succeeds.
///
/// Content is written to a temporary file in the target's directory and
/// renamed over the target by [`commit`](AtomicOutput::commit). Dropping
/// without committing removes the temporary file and leaves any existing
/// target untouched.
pub struct AtomicOutput {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicOutput {
    /// Prepare to write `target`. Its parent directory must exist.
    pub fn create(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        if !dir.is_dir() {
            return Err(ConversionError::io(
                &dir,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "output directory does not exist",
                ),
            ));
        }

        let temp = NamedTempFile::new_in(&dir).map_err(|e| ConversionError::io(&dir, e))?;

        Ok(Self {
            target,
            writer: BufWriter::new(temp),
        })
    }

    /// The final path.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flush and move the temporary file into place.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| ConversionError::io(&target, e.into_error()))?;

        temp.persist(&target)
            .map_err(|e| ConversionError::io(&target, e.error))?;

        tracing::debug!(path = %target.display(), "Output committed");
        Ok(())
    }
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Write a whole file atomically.
pub fn write_atomic(target: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let mut output = AtomicOutput::create(target)?;
    let target = output.target().to_path_buf();
    output
        .write_all(contents)
        .map_err(|e| ConversionError::io(&target, e))?;
    output.commit()
}
