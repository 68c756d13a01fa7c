// Delimited QA report import/export
//
// Reports are `;`-delimited, `"`-quoted, UTF-8 with a BOM on write. The BOM
// is tolerated (and stripped) on read.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use qaledger_core::{Column, RawTable, Record};

use crate::error::IoError;

pub const DELIMITER: u8 = b';';
const BOM: &str = "\u{feff}";

pub fn read_table(path: &Path) -> Result<RawTable, IoError> {
    let content = read_file_as_utf8(path)?;
    match parse_table(&content) {
        Ok(Some(table)) => Ok(table),
        Ok(None) => Err(IoError::NoHeader { path: path.to_path_buf() }),
        Err(e) => Err(IoError::parse(path, e)),
    }
}

/// Read file and convert to UTF-8 if needed (Excel-exported reports are often Windows-1252)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Split report text into a header row and data rows. `None` when the text
/// holds no rows at all.
pub fn parse_table(content: &str) -> Result<Option<RawTable>, csv::Error> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(str::to_string).collect(),
        None => return Ok(None),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Some(RawTable::new(headers, rows)))
}

/// Write records to a new report file: BOM, header, one row per record, in
/// the order given.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), IoError> {
    let mut file = std::fs::File::create(path).map_err(|e| IoError::write(path, e))?;
    file.write_all(BOM.as_bytes()).map_err(|e| IoError::write(path, e))?;
    write_report(&mut file, records).map_err(|e| IoError::write(path, e))
}

/// Header plus records in report format, without BOM.
pub fn write_report<W: Write>(out: W, records: &[Record]) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().delimiter(DELIMITER).from_writer(out);
    writer.write_record(Column::headers())?;
    for record in records {
        writer.write_record(record.to_cells())?;
    }
    writer.flush()?;
    Ok(())
}

/// Create a report file holding only the header row.
pub fn create_empty(path: &Path) -> Result<(), IoError> {
    write_records(path, &[])
}

/// Append raw data rows to an existing report file. Rows are written as
/// given; no header and no BOM. A file whose last line is unterminated gets
/// a line break first, so the first new row starts on its own line.
pub fn append_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), IoError> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| IoError::write(path, e))?;
    if ends_unterminated(&mut file).map_err(|e| IoError::read(path, e))? {
        file.write_all(b"\n").map_err(|e| IoError::write(path, e))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(file);
    for row in rows {
        writer.write_record(row).map_err(|e| IoError::write(path, e))?;
    }
    writer.flush().map_err(|e| IoError::write(path, e))
}

fn ends_unterminated(file: &mut std::fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(!matches!(last[0], b'\n' | b'\r'))
}
