//! CSV export of flattened sensor records.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

use crate::model::FlatRecord;

/// Errors that can occur while writing the export file.
#[derive(Debug)]
pub enum ExportError {
    /// Nothing to write; callers report "no data" instead of exporting
    NoRecords,

    /// The file could not be created, flushed or moved into place
    Io(std::io::Error),

    /// A record could not be serialized
    Csv(csv::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::NoRecords => write!(f, "No records to export"),
            ExportError::Io(e) => write!(f, "Failed to write export file: {}", e),
            ExportError::Csv(e) => write!(f, "Failed to serialize record: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::NoRecords => None,
            ExportError::Io(e) => Some(e),
            ExportError::Csv(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err)
    }
}

/// Write `records` to `path` as CSV and return the path written.
///
/// The header row is derived from [`FlatRecord`]'s field order; empty cells
/// stand for missing values. Rows go to a temp file in the destination
/// directory which is renamed over `path` only once every row is written, so
/// a failed export never leaves a truncated file behind.
pub fn export_csv(records: &[FlatRecord], path: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut writer = csv::Writer::from_writer(NamedTempFile::new_in(dir)?);
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    let staged = writer.into_inner().map_err(|e| {
        ExportError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    staged.persist(path).map_err(|e| ExportError::Io(e.error))?;

    info!(path = %path.display(), rows = records.len(), "Data exported to {}", path.display());

    Ok(path.to_path_buf())
}
