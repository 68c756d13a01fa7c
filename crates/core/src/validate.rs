//! Row validation shared by both ingestion pipelines.
//!
//! There is exactly one set of invariants. [`Strictness`] selects the order in
//! which they are checked (and therefore which reason a multiply-broken row
//! reports) and whether a rejection is an expected artifact of the source.

use std::collections::HashMap;

use serde::Serialize;

use crate::date::normalize_date;
use crate::record::{Column, Flag, Record};

/// How much the source is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Schema-correct, complete source. Dates and flags are the checks
    /// expected to fail, so they run first.
    Trusted,
    /// Messy source. Empty cells are screened before anything else.
    Untrusted,
}

impl Strictness {
    /// True when the rejection is a known data-quality artifact of the source
    /// and should be reported without raising a warning.
    pub fn is_expected(&self, reason: &RejectReason) -> bool {
        match self {
            Self::Trusted => false,
            Self::Untrusted => matches!(
                reason,
                RejectReason::Missing | RejectReason::Empty | RejectReason::NotInteger { .. }
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("value is missing")]
    Missing,
    #[error("value is empty")]
    Empty,
    #[error("'{value}' is not an integer")]
    NotInteger { value: String },
    #[error("'{value}' is not a positive integer")]
    NotPositive { value: String },
    #[error("cannot parse date '{value}'")]
    UnparseableDate { value: String },
    #[error("'{value}' is not yes or no")]
    InvalidFlag { value: String },
}

/// A row that violates a record invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("column '{column}': {reason}")]
pub struct RowValidationError {
    pub column: Column,
    pub reason: RejectReason,
}

impl RowValidationError {
    fn new(column: Column, reason: RejectReason) -> Self {
        Self { column, reason }
    }

    /// The date-parse specialization.
    pub fn is_date_parse(&self) -> bool {
        matches!(self.reason, RejectReason::UnparseableDate { .. })
    }
}

/// Validate one row of raw cells into a [`Record`].
///
/// `fields` maps each canonical column to its raw cell; `None` is an absent
/// cell. Values are trimmed before any check.
pub fn validate(
    fields: &HashMap<Column, Option<String>>,
    strictness: Strictness,
) -> Result<Record, RowValidationError> {
    let cell = |col: Column| -> Result<&str, RowValidationError> {
        match fields.get(&col).and_then(|v| v.as_deref()) {
            None => Err(RowValidationError::new(col, RejectReason::Missing)),
            Some(v) if v.trim().is_empty() => Err(RowValidationError::new(col, RejectReason::Empty)),
            Some(v) => Ok(v.trim()),
        }
    };

    if strictness == Strictness::Untrusted {
        for col in Column::ALL {
            cell(col)?;
        }
        test_number(cell(Column::TestNumber)?)?;
    }

    let build_date = parse_build_date(cell(Column::BuildDate)?)?;
    let repeatable = flag(Column::Repeatable, cell(Column::Repeatable)?)?;
    let blocker = flag(Column::Blocker, cell(Column::Blocker)?)?;

    Ok(Record {
        test_number: test_number(cell(Column::TestNumber)?)?,
        build_date,
        category: cell(Column::Category)?.to_string(),
        test_case: cell(Column::TestCase)?.to_string(),
        expected_result: cell(Column::ExpectedResult)?.to_string(),
        actual_result: cell(Column::ActualResult)?.to_string(),
        repeatable,
        blocker,
        test_owner: cell(Column::TestOwner)?.to_string(),
    })
}

fn test_number(value: &str) -> Result<i64, RowValidationError> {
    let digits = value.strip_prefix(&['+', '-'][..]).unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RowValidationError::new(
            Column::TestNumber,
            RejectReason::NotInteger { value: value.into() },
        ));
    }
    let n: i64 = value.parse().map_err(|_| {
        RowValidationError::new(Column::TestNumber, RejectReason::NotInteger { value: value.into() })
    })?;
    if n <= 0 {
        return Err(RowValidationError::new(
            Column::TestNumber,
            RejectReason::NotPositive { value: value.into() },
        ));
    }
    Ok(n)
}

fn parse_build_date(value: &str) -> Result<chrono::NaiveDate, RowValidationError> {
    normalize_date(value).ok_or_else(|| {
        RowValidationError::new(Column::BuildDate, RejectReason::UnparseableDate { value: value.into() })
    })
}

fn flag(column: Column, value: &str) -> Result<Flag, RowValidationError> {
    Flag::parse(value)
        .ok_or_else(|| RowValidationError::new(column, RejectReason::InvalidFlag { value: value.into() }))
}
