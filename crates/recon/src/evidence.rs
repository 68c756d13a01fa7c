use std::collections::BTreeMap;

use qaledger_core::Strictness;
use serde::Serialize;

use crate::model::{CollectionKind, Ingested, IngestionError};

/// Counts for one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub collection: CollectionKind,
    pub strictness: Strictness,
    pub rows_read: usize,
    pub admitted: usize,
    pub skipped: usize,
    /// Skips keyed by the column that failed.
    pub skipped_by_column: BTreeMap<String, usize>,
}

/// Summary plus every skipped row, for auditing what was dropped and why.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub summary: IngestSummary,
    pub skipped: Vec<IngestionError>,
}

pub fn compute_summary(ingested: &Ingested) -> IngestSummary {
    let mut skipped_by_column: BTreeMap<String, usize> = BTreeMap::new();
    for skip in &ingested.skipped {
        *skipped_by_column.entry(skip.error.column().to_string()).or_insert(0) += 1;
    }

    let kind = ingested.collection.kind();
    IngestSummary {
        collection: kind,
        strictness: kind.strictness(),
        rows_read: ingested.rows_read,
        admitted: ingested.collection.len(),
        skipped: ingested.skipped.len(),
        skipped_by_column,
    }
}

pub fn build_report(ingested: &Ingested) -> IngestReport {
    IngestReport {
        summary: compute_summary(ingested),
        skipped: ingested.skipped.clone(),
    }
}
