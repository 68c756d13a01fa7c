// Excel dump import
//
// Only the first worksheet is read. Its first row is the header; every cell
// is rendered to the text a delimited export of the same sheet would hold,
// so both dump shapes flow through the same validation.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use qaledger_core::RawTable;

use crate::error::IoError;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn read_table(path: &Path) -> Result<RawTable, IoError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| IoError::read(path, format!("failed to open Excel file: {}", e)))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::parse(path, "Excel file contains no sheets"))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| IoError::parse(path, format!("failed to read sheet '{}': {}", first, e)))?;

    let mut rows = range.rows().map(|row| row.iter().map(render_cell).collect::<Vec<String>>());

    let headers = rows.next().ok_or_else(|| IoError::NoHeader { path: path.to_path_buf() })?;
    // Blank rows inside the used range carry nothing to validate
    let data: Vec<Vec<String>> = rows
        .filter(|cells| cells.iter().any(|c| !c.is_empty()))
        .collect();

    log::debug!("read {} data row(s) from sheet '{}' of {}", data.len(), first, path.display());
    Ok(RawTable::new(headers, data))
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        // Integers without decimals
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        Data::Float(n) => n.to_string(),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format(DATETIME_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.replacen('T', " ", 1),
        Data::DurationIso(s) => s.clone(),
    }
}
