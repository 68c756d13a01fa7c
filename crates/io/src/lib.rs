// File I/O operations

pub mod collect;
pub mod csv;
pub mod error;
pub mod store;
pub mod xlsx;

pub use error::IoError;
pub use store::SqliteStore;

use std::path::Path;

use qaledger_core::RawTable;

/// Read the organization dump. `.csv`/`.txt` files use the delimited reader,
/// anything else goes through the spreadsheet reader.
pub fn read_dump(path: &Path) -> Result<RawTable, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "txt" => csv::read_table(path),
        _ => xlsx::read_table(path),
    }
}
