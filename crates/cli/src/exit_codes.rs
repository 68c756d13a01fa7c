//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success (including queries with no results)               |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args, unparseable date argument)     |
//! | 3    | Schema error: input lacks a required column               |
//! | 4    | Structural access: input file or store cannot be used     |
//! | 5    | Ordinal query against an empty collection                 |
//! | 6    | Settings file unreadable or malformed                     |
//!
//! Row-level validation failures never change the exit code; they are
//! reported and skipped.

use qaledger_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (e.g. stdout closed).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments.
pub const EXIT_USAGE: u8 = 2;

/// Required column missing from an ingestion input. Nothing was committed.
pub const EXIT_SCHEMA: u8 = 3;

/// Input file, dump or store could not be opened, read or written.
pub const EXIT_STRUCTURAL: u8 = 4;

/// first/middle/last issued against an empty GlobalCollection.
pub const EXIT_EMPTY_COLLECTION: u8 = 5;

/// Settings file could not be read or parsed.
pub const EXIT_CONFIG: u8 = 6;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::Schema { .. } => EXIT_SCHEMA,
        ReconError::StructuralAccess(_) => EXIT_STRUCTURAL,
        ReconError::EmptyCollection(_) => EXIT_EMPTY_COLLECTION,
    }
}

