//! Record output for listing and ordinal subcommands.
//!
//! Records go to stdout as report rows (`;`-delimited, with header), as JSON
//! with `--json`, or to a report file with `-o`. Status messages go to stderr
//! so stdout stays pipeable.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use qaledger_core::Record;
use qaledger_io::csv;

use crate::CliError;

pub const NO_RESULTS: &str = "No results found.";

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print JSON instead of report rows
    #[arg(long)]
    pub json: bool,

    /// Write a report file instead of printing
    #[arg(long, short = 'o', conflicts_with = "json")]
    pub output: Option<PathBuf>,
}

pub fn emit_records(records: &[Record], args: &OutputArgs) -> Result<(), CliError> {
    if let Some(path) = &args.output {
        csv::write_records(path, records)?;
        eprintln!("wrote {} record(s) to {}", records.len(), path.display());
    } else if args.json {
        print_json(records)?;
    } else if !records.is_empty() {
        let stdout = io::stdout();
        csv::write_report(stdout.lock(), records).map_err(|e| CliError::general(e.to_string()))?;
    }

    if records.is_empty() {
        eprintln!("{}", NO_RESULTS);
    }
    Ok(())
}

pub fn emit_record(record: &Record, json: bool) -> Result<(), CliError> {
    if json {
        print_json(record)
    } else {
        let stdout = io::stdout();
        csv::write_report(stdout.lock(), std::slice::from_ref(record))
            .map_err(|e| CliError::general(e.to_string()))
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(|e| CliError::general(e.to_string()))?;
    writeln!(handle).map_err(|e| CliError::general(e.to_string()))
}
