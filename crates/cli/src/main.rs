// qaledger - collect, ingest and query QA test-case reports
//
// Every subcommand opens the record store for its own duration only; the
// connection is released when the command returns, on success or error.

mod exit_codes;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qaledger_config::{ConfigError, Settings};
use qaledger_core::{normalize_date, Column, Record};
use qaledger_io::collect::collect_reports;
use qaledger_io::{csv, read_dump, IoError, SqliteStore};
use qaledger_recon::evidence::{build_report, compute_summary};
use qaledger_recon::{
    commit, ingest_trusted, ingest_untrusted, CollectionKind, QueryEngine, ReconError, StoreError,
};

use exit_codes::{
    recon_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_STRUCTURAL, EXIT_SUCCESS, EXIT_USAGE,
};
use output::{emit_record, emit_records, print_json, OutputArgs, NO_RESULTS};

const LOG_ENV: &str = "QALEDGER_LOG";

#[derive(Parser)]
#[command(name = "qaledger")]
#[command(about = "Collect, ingest and query QA test-case reports")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file [default: <config dir>/qaledger/settings.toml]
    #[arg(long, global = true, env = "QALEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Record store database (overrides store.path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Debug logging (overrides QALEDGER_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Append every report in the reports directory to the personal collection file
    #[command(after_help = "\
Creates the personal file with a header row if it does not exist. Reports
are appended in file-name order; unreadable reports are skipped and listed.

Examples:
  qaledger collect
  qaledger collect --reports MyReports --personal MyCollection.csv")]
    Collect {
        /// Reports directory [default: sources.reports_dir]
        #[arg(long)]
        reports: Option<PathBuf>,

        /// Personal collection file [default: sources.personal]
        #[arg(long)]
        personal: Option<PathBuf>,
    },

    /// Validate a source file and commit its valid rows to the store
    #[command(after_help = "\
personal: trusted delimited file, dates as MM/DD/YYYY.
global:   untrusted organization dump (.xlsx, or .csv), dates as
          YYYY-MM-DD HH:MM:SS.

Invalid rows are skipped and reported; a missing column aborts with
nothing committed.

Examples:
  qaledger ingest personal
  qaledger ingest global EG4-DBDump.xlsx --replace
  qaledger ingest global dump.csv --json > skipped.json")]
    Ingest {
        /// Which collection the file feeds
        source: Source,

        /// Input file [default: sources.personal / sources.global]
        file: Option<PathBuf>,

        /// Empty the collection before committing
        #[arg(long)]
        replace: bool,

        /// Print the ingestion report (summary and every skipped row) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write every GlobalCollection row owned by NAME to a report file, unfiltered
    #[command(after_help = "\
Examples:
  qaledger export-owner
  qaledger export-owner \"Kevin Chaja\" -o KevinChaja.csv")]
    ExportOwner {
        /// Test owner [default: query.export_owner]
        name: Option<String>,

        /// Output file [default: <export.dir>/<NameWithoutSpaces>.csv]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// All work by one owner, both collections, no duplicates
    #[command(after_help = "\
Owner match is exact and case-sensitive.

Examples:
  qaledger owner \"Angel Venegas\"
  qaledger owner --json")]
    Owner {
        /// Test owner [default: query.owner]
        name: Option<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// All repeatable bugs, both collections, no duplicates
    #[command(after_help = "\
Examples:
  qaledger repeatable
  qaledger repeatable -o All_Repeatable_Bugs.csv")]
    Repeatable {
        #[command(flatten)]
        out: OutputArgs,
    },

    /// All blocker bugs, both collections, no duplicates
    #[command(after_help = "\
Examples:
  qaledger blocker
  qaledger blocker -o All_Blocker_Bugs.csv")]
    Blocker {
        #[command(flatten)]
        out: OutputArgs,
    },

    /// All reports on one build date, both collections, no duplicates
    #[command(after_help = "\
DATE accepts MM/DD/YYYY (also M/D/YY) or YYYY-MM-DD[ HH:MM:SS].

Examples:
  qaledger build 03/19/2024
  qaledger build 2024-03-19 --json")]
    Build {
        /// Build date [default: query.build_date]
        date: Option<String>,

        #[command(flatten)]
        out: OutputArgs,
    },

    /// Earliest-build test case in GlobalCollection
    First {
        #[arg(long)]
        json: bool,
    },

    /// Middle test case in GlobalCollection by build date
    #[command(after_help = "\
For N rows ordered by build date, the middle is row (N+1)/2 (1-based,
rounded down). Equal dates keep insertion order.")]
    Middle {
        #[arg(long)]
        json: bool,
    },

    /// Latest-build test case in GlobalCollection
    Last {
        #[arg(long)]
        json: bool,
    },

    /// Row counts per collection
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Source {
    Personal,
    Global,
}

impl Source {
    fn kind(self) -> CollectionKind {
        match self {
            Source::Personal => CollectionKind::Personal,
            Source::Global => CollectionKind::Global,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Log to stderr. `--verbose` forces debug; otherwise QALEDGER_LOG, default info.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Also installs the `log` bridge, so library records reach this layer
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Some(command) = cli.command else {
        eprintln!("Usage: qaledger <command> [options]");
        eprintln!("       qaledger --help for more information");
        return Ok(());
    };

    let settings = Settings::load(cli.config.as_deref())?;
    let store_path = cli.store.unwrap_or_else(|| settings.store.path.clone());

    match command {
        Commands::Collect { reports, personal } => cmd_collect(
            reports.unwrap_or_else(|| settings.sources.reports_dir.clone()),
            personal.unwrap_or_else(|| settings.sources.personal.clone()),
        ),
        Commands::Ingest { source, file, replace, json } => {
            let file = file.unwrap_or_else(|| match source {
                Source::Personal => settings.sources.personal.clone(),
                Source::Global => settings.sources.global.clone(),
            });
            cmd_ingest(&store_path, source.kind(), &file, replace, json)
        }
        Commands::ExportOwner { name, output } => {
            let name = name.unwrap_or_else(|| settings.query.export_owner.clone());
            let output = output.unwrap_or_else(|| settings.export_path(&export_file_name(&name)));
            cmd_export_owner(&store_path, &name, &output)
        }
        Commands::Owner { name, out } => {
            let name = name.unwrap_or_else(|| settings.query.owner.clone());
            with_query(&store_path, |q| emit_records(&q.list_by_owner(&name)?, &out))
        }
        Commands::Repeatable { out } => with_query(&store_path, |q| emit_records(&q.list_repeatable()?, &out)),
        Commands::Blocker { out } => with_query(&store_path, |q| emit_records(&q.list_blocker()?, &out)),
        Commands::Build { date, out } => {
            let raw = date.unwrap_or_else(|| settings.query.build_date.clone());
            let date = normalize_date(&raw).ok_or_else(|| {
                CliError::usage(format!("invalid build date '{}'", raw))
                    .with_hint("use MM/DD/YYYY or YYYY-MM-DD")
            })?;
            with_query(&store_path, |q| emit_records(&q.list_by_build_date(date)?, &out))
        }
        Commands::First { json } => with_query(&store_path, |q| emit_record(&q.first_by_build_date()?, json)),
        Commands::Middle { json } => with_query(&store_path, |q| emit_record(&q.middle_by_build_date()?, json)),
        Commands::Last { json } => with_query(&store_path, |q| emit_record(&q.last_by_build_date()?, json)),
        Commands::Status { json } => cmd_status(&store_path, json),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::Schema { .. } => Some(format!("expected header: {}", Column::headers().join(";"))),
            ReconError::EmptyCollection(CollectionKind::Global) => {
                Some("run `qaledger ingest global` first".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self { code: EXIT_STRUCTURAL, message: err.to_string(), hint: None }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        Self { code: EXIT_STRUCTURAL, message: err.to_string(), hint: None }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => {
                format!("fix or remove {}", path.display())
            }
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint: Some(hint) }
    }
}

// ============================================================================
// store access
// ============================================================================

fn open_store(path: &Path) -> Result<SqliteStore, CliError> {
    tracing::debug!("opening store {}", path.display());
    Ok(SqliteStore::open(path)?)
}

/// Run a read-only query against a freshly opened store.
fn with_query<F>(path: &Path, f: F) -> Result<(), CliError>
where
    F: FnOnce(&QueryEngine<'_, SqliteStore>) -> Result<(), CliError>,
{
    let store = open_store(path)?;
    f(&QueryEngine::new(&store))
}

// ============================================================================
// collect
// ============================================================================

fn cmd_collect(reports: PathBuf, personal: PathBuf) -> Result<(), CliError> {
    let report = collect_reports(&reports, &personal).map_err(|e| {
        let hint = format!("create {} and put your report files in it", reports.display());
        CliError::from(e).with_hint(hint)
    })?;

    if report.created {
        eprintln!("{} created.", personal.display());
    }
    for (file, rows) in &report.appended {
        eprintln!("appended {} row(s) from {}", rows, file.display());
    }
    for err in &report.failed {
        eprintln!("skipped {}: {}", err.path().display(), err);
    }
    eprintln!(
        "{}: {} row(s) appended from {} report(s)",
        personal.display(),
        report.rows_appended(),
        report.appended.len()
    );
    Ok(())
}

// ============================================================================
// ingest
// ============================================================================

fn cmd_ingest(store_path: &Path, kind: CollectionKind, file: &Path, replace: bool, json: bool) -> Result<(), CliError> {
    let table = match kind {
        CollectionKind::Personal => csv::read_table(file),
        CollectionKind::Global => read_dump(file),
    }
    .map_err(|e| {
        let hint = match kind {
            CollectionKind::Personal => "run `qaledger collect` to build the personal collection file",
            CollectionKind::Global => "pass the dump path, or set sources.global in settings",
        };
        CliError::from(e).with_hint(hint)
    })?;

    let ingested = match kind {
        CollectionKind::Personal => ingest_trusted(&table)?,
        CollectionKind::Global => ingest_untrusted(&table)?,
    };

    let mut store = open_store(store_path)?;
    let stored = commit(&mut store, &ingested, replace)?;

    let summary = compute_summary(&ingested);
    eprintln!(
        "{}: {} row(s) read, {} stored, {} skipped",
        kind, summary.rows_read, stored, summary.skipped
    );

    if json {
        print_json(&build_report(&ingested))?;
    }
    Ok(())
}

// ============================================================================
// export-owner
// ============================================================================

fn export_file_name(owner: &str) -> String {
    let stem: String = owner.split_whitespace().collect();
    format!("{}.csv", if stem.is_empty() { "owner" } else { stem.as_str() })
}

fn cmd_export_owner(store_path: &Path, name: &str, output: &Path) -> Result<(), CliError> {
    let store = open_store(store_path)?;
    let rows: Vec<Record> = QueryEngine::new(&store).list_all_by_owner_from_global(name)?;

    csv::write_records(output, &rows)?;
    eprintln!("CSV file '{}' generated with {} record(s).", output.display(), rows.len());
    if rows.is_empty() {
        eprintln!("{}", NO_RESULTS);
    }
    Ok(())
}

// ============================================================================
// status
// ============================================================================

fn cmd_status(store_path: &Path, json: bool) -> Result<(), CliError> {
    let store = open_store(store_path)?;
    let counts = QueryEngine::new(&store).collection_counts()?;

    if json {
        let map: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(kind, n)| (kind.table_name().to_string(), serde_json::Value::from(*n)))
            .collect();
        print_json(&map)
    } else {
        for (kind, n) in &counts {
            println!("{:<20} {}", kind.table_name(), n);
        }
        Ok(())
    }
}
