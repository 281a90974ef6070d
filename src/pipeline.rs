//! One complete collection run: poll, flatten, and export.
//!
//! `main` only maps the result of [`run`] to an exit code.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::client::SensorSource;
use crate::collector::{collect, CollectionStats, PollSchedule};
use crate::export::{export_csv, ExportError};
use crate::flatten::flatten;

/// How a finished run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Flattening produced no rows, so nothing was exported
    NoData { stats: CollectionStats },

    /// Rows were written to `path`
    Exported {
        path: PathBuf,
        records: usize,
        stats: CollectionStats,
    },
}

impl RunReport {
    pub fn stats(&self) -> &CollectionStats {
        match self {
            RunReport::NoData { stats } | RunReport::Exported { stats, .. } => stats,
        }
    }
}

/// Poll `source` per `schedule`, flatten every reading, and export to `export_path`.
///
/// Failed polls never fail the run; they only shrink the export. When no rows
/// are left the exporter is not called and [`RunReport::NoData`] is returned.
///
/// # Errors
///
/// Returns `ExportError` only if writing the export file fails.
pub async fn run<S>(
    source: &S,
    schedule: PollSchedule,
    export_path: &Path,
) -> Result<RunReport, ExportError>
where
    S: SensorSource + ?Sized,
{
    let collection = collect(source, schedule).await;
    let stats = collection.stats();

    info!("Processing data...");
    let records = flatten(&collection.outcomes);

    if records.is_empty() {
        info!("No data to export.");
        return Ok(RunReport::NoData { stats });
    }

    let path = export_csv(&records, export_path)?;
    info!(
        run_id = %collection.run_id,
        "Collection complete. Processed {} data points.",
        records.len()
    );

    Ok(RunReport::Exported {
        path,
        records: records.len(),
        stats,
    })
}
