use qaledger_core::{Record, RejectReason, RowValidationError, Strictness};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

/// The two sources. Each maps to one store table with the record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CollectionKind {
    /// Built from the trusted personal collection file.
    #[serde(rename = "PersonalCollection")]
    Personal,
    /// Built from the untrusted organization dump.
    #[serde(rename = "GlobalCollection")]
    Global,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 2] = [CollectionKind::Personal, CollectionKind::Global];

    /// Store table name. A closed set, never derived from input.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Personal => "PersonalCollection",
            Self::Global => "GlobalCollection",
        }
    }

    pub fn strictness(&self) -> Strictness {
        match self {
            Self::Personal => Strictness::Trusted,
            Self::Global => Strictness::Untrusted,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Ordered, append-only records from one source.
#[derive(Debug, Clone)]
pub struct Collection {
    kind: CollectionKind,
    records: Vec<Record>,
}

impl Collection {
    pub fn new(kind: CollectionKind) -> Self {
        Self { kind, records: Vec::new() }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn push(&mut self, record: Record) {
        self.records.push(record);
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Ingestion output
// ---------------------------------------------------------------------------

/// One skipped input row.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionError {
    /// 1-based data row number (header excluded).
    pub row: usize,
    /// Raw `Test #` cell, when the row had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_number: Option<String>,
    pub error: SkipCause,
}

impl std::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.error)
    }
}

/// Why a row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(untagged)]
pub enum SkipCause {
    /// A record column failed validation.
    #[error(transparent)]
    Invalid(#[from] RowValidationError),
    /// A column outside the record schema was blank or absent.
    #[error("column '{column}': {reason}")]
    Extra { column: String, reason: RejectReason },
}

impl SkipCause {
    /// Header of the failing column.
    pub fn column(&self) -> &str {
        match self {
            Self::Invalid(err) => err.column.header(),
            Self::Extra { column, .. } => column,
        }
    }

    pub fn reason(&self) -> &RejectReason {
        match self {
            Self::Invalid(err) => &err.reason,
            Self::Extra { reason, .. } => reason,
        }
    }

    pub fn is_date_parse(&self) -> bool {
        matches!(self, Self::Invalid(err) if err.is_date_parse())
    }
}

/// Result of one ingestion run, not yet committed.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub collection: Collection,
    /// Skipped rows in input order.
    pub skipped: Vec<IngestionError>,
    pub rows_read: usize,
}
