//! Assemble the personal collection file from loose report files.
//!
//! Each report in the reports directory is a delimited file with its own
//! header row. Data rows are appended to the personal file in file-name order.
//! Reports that cannot be read are recorded and skipped; the rest still land.

use std::path::{Path, PathBuf};

use crate::csv;
use crate::error::IoError;

/// Outcome of one collection pass.
#[derive(Debug, Default)]
pub struct CollectReport {
    /// The personal file did not exist and was created with a header.
    pub created: bool,
    /// (report, data rows appended)
    pub appended: Vec<(PathBuf, usize)>,
    pub failed: Vec<IoError>,
}

impl CollectReport {
    pub fn rows_appended(&self) -> usize {
        self.appended.iter().map(|(_, n)| n).sum()
    }
}

pub fn collect_reports(reports_dir: &Path, personal: &Path) -> Result<CollectReport, IoError> {
    let mut report = CollectReport::default();

    if !personal.exists() {
        csv::create_empty(personal)?;
        log::info!("{} created", personal.display());
        report.created = true;
    }

    let entries = std::fs::read_dir(reports_dir).map_err(|e| IoError::read(reports_dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for file in files {
        // Re-collecting into a file that lives inside the reports dir would duplicate it
        if same_file(&file, personal) {
            continue;
        }
        match csv::read_table(&file) {
            Ok(table) => {
                csv::append_rows(personal, &table.rows)?;
                log::info!("data from {} appended to {}", file.display(), personal.display());
                report.appended.push((file, table.rows.len()));
            }
            Err(e) => {
                log::warn!("{}", e);
                report.failed.push(e);
            }
        }
    }

    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
