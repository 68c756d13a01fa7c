use std::collections::{HashMap, HashSet};

use qaledger_core::{validate, Column, RawTable, RejectReason};

use crate::error::ReconError;
use crate::model::{Collection, CollectionKind, Ingested, IngestionError, SkipCause};
use crate::store::RecordStore;

/// Parse the personal collection.
///
/// The source is schema-correct by contract, but dates and flags are still
/// checked; failing rows are skipped with a warning and ingestion continues.
pub fn ingest_trusted(table: &RawTable) -> Result<Ingested, ReconError> {
    ingest(table, CollectionKind::Personal)
}

/// Parse the organization dump.
///
/// Rows with an empty cell in any named column, non-integer `Test #` values or out-of-domain flags
/// are skipped. Every skip is returned; only the expected artifacts are
/// logged quietly.
pub fn ingest_untrusted(table: &RawTable) -> Result<Ingested, ReconError> {
    ingest(table, CollectionKind::Global)
}

fn ingest(table: &RawTable, kind: CollectionKind) -> Result<Ingested, ReconError> {
    let missing = table.missing_columns();
    if !missing.is_empty() {
        return Err(ReconError::Schema {
            missing: missing.iter().map(|c| c.header().to_string()).collect(),
        });
    }

    let strictness = kind.strictness();
    let index = table.column_index();
    let mut collection = Collection::new(kind);
    let mut skipped = Vec::new();

    for row in 0..table.rows.len() {
        let fields = table.fields(&index, row);
        let mut outcome = validate(&fields, strictness).map_err(SkipCause::from);
        if kind == CollectionKind::Global && !matches!(&outcome, Err(e) if is_blank(e.reason())) {
            if let Some(extra) = blank_extra_cell(table, &index, row) {
                outcome = Err(extra);
            }
        }

        match outcome {
            Ok(record) => collection.push(record),
            Err(error) => {
                let skip = IngestionError {
                    row: row + 1,
                    test_number: fields.get(&Column::TestNumber).cloned().flatten(),
                    error,
                };
                if strictness.is_expected(skip.error.reason()) {
                    log::debug!("{kind}: skipping {skip}");
                } else {
                    log::warn!("{kind}: skipping {skip}");
                }
                skipped.push(skip);
            }
        }
    }

    log::info!(
        "{kind}: {} of {} row(s) admitted, {} skipped",
        collection.len(),
        table.rows.len(),
        skipped.len(),
    );

    Ok(Ingested {
        collection,
        skipped,
        rows_read: table.rows.len(),
    })
}

fn is_blank(reason: &RejectReason) -> bool {
    matches!(reason, RejectReason::Missing | RejectReason::Empty)
}

/// First blank or absent cell in a named column outside the record schema.
/// Columns with a blank header carry no data and are ignored.
fn blank_extra_cell(table: &RawTable, index: &HashMap<Column, usize>, row: usize) -> Option<SkipCause> {
    let record_columns: HashSet<usize> = index.values().copied().collect();
    let cells = table.rows.get(row).map(|r| r.as_slice()).unwrap_or(&[]);
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| !record_columns.contains(i) && !h.trim().is_empty())
        .find_map(|(i, h)| {
            let reason = match cells.get(i) {
                None => RejectReason::Missing,
                Some(v) if v.trim().is_empty() => RejectReason::Empty,
                Some(_) => return None,
            };
            Some(SkipCause::Extra { column: h.trim().to_string(), reason })
        })
}

/// Commit an ingestion run as one batch. With `replace`, the target
/// collection is cleared inside the same batch first.
pub fn commit<S: RecordStore + ?Sized>(
    store: &mut S,
    ingested: &Ingested,
    replace: bool,
) -> Result<usize, ReconError> {
    let kind = ingested.collection.kind();
    let stored = store.commit(kind, ingested.collection.records(), replace)?;
    log::info!("{kind}: committed {stored} record(s){}", if replace { " (replaced)" } else { "" });
    Ok(stored)
}
