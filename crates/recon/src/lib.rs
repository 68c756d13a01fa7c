//! `qaledger-recon`: Two-source QA record reconciliation.
//!
//! Pure engine crate: receives pre-read tables, validates them into
//! collections, and answers queries through the [`RecordStore`] contract.
//! No CLI or file IO dependencies.

pub mod error;
pub mod evidence;
pub mod ingest;
pub mod model;
pub mod query;
pub mod store;

pub use error::{ReconError, StoreError};
pub use ingest::{commit, ingest_trusted, ingest_untrusted};
pub use model::{Collection, CollectionKind, Ingested, IngestionError, SkipCause};
pub use query::QueryEngine;
pub use store::{DateOrder, Filter, MemoryStore, RecordStore};
