//! `qaledger-core`: the QA test-case record model.
//!
//! Pure types and functions: no IO, no store. Both ingestion pipelines and
//! every reader/writer build on the definitions here.

pub mod date;
pub mod record;
pub mod validate;

pub use date::{normalize_date, render_slash};
pub use record::{Column, Flag, RawTable, Record};
pub use validate::{validate, RejectReason, RowValidationError, Strictness};
