use crate::model::CollectionKind;

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// Required column(s) absent from an ingestion input. Nothing is committed.
    #[error("missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },
    /// Input source or store cannot be opened or read.
    #[error("structural access error: {0}")]
    StructuralAccess(String),
    /// Ordinal query issued against an empty collection.
    #[error("{0} is empty")]
    EmptyCollection(CollectionKind),
}

/// Failure reported by a [`crate::RecordStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open store: {0}")]
    Open(String),
    #[error("store query failed: {0}")]
    Query(String),
    #[error("store commit failed: {0}")]
    Commit(String),
    #[error("corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },
}

impl From<StoreError> for ReconError {
    fn from(err: StoreError) -> Self {
        ReconError::StructuralAccess(err.to_string())
    }
}
