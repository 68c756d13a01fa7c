use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// The nine canonical columns, in interchange order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    TestNumber,
    BuildDate,
    Category,
    TestCase,
    ExpectedResult,
    ActualResult,
    Repeatable,
    Blocker,
    TestOwner,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::TestNumber,
        Column::BuildDate,
        Column::Category,
        Column::TestCase,
        Column::ExpectedResult,
        Column::ActualResult,
        Column::Repeatable,
        Column::Blocker,
        Column::TestOwner,
    ];

    /// Header text used by the tabular file format.
    pub fn header(&self) -> &'static str {
        match self {
            Self::TestNumber => "Test #",
            Self::BuildDate => "Build #",
            Self::Category => "Category",
            Self::TestCase => "Test Case",
            Self::ExpectedResult => "Expected Result",
            Self::ActualResult => "Actual Result",
            Self::Repeatable => "Repeatable?",
            Self::Blocker => "Blocker?",
            Self::TestOwner => "Test Owner",
        }
    }

    pub fn headers() -> [&'static str; 9] {
        Self::ALL.map(|c| c.header())
    }

    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Flag
// ---------------------------------------------------------------------------

/// A yes/no flag that keeps the source's casing for display.
///
/// Equality and hashing are case-insensitive, so `"Yes"` and `"yes"` are the
/// same flag for deduplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(String);

impl Flag {
    /// Accepts "yes"/"no" in any casing; surrounding whitespace is dropped.
    pub fn parse(raw: &str) -> Option<Flag> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("yes") || raw.eq_ignore_ascii_case("no") {
            Some(Flag(raw.to_string()))
        } else {
            None
        }
    }

    pub fn is_yes(&self) -> bool {
        self.0.eq_ignore_ascii_case("yes")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        self.is_yes() == other.is_yes()
    }
}

impl Eq for Flag {}

impl Hash for Flag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_yes().hash(state);
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One validated QA test-case observation.
///
/// Only [`crate::validate`] constructs records from raw input, so every
/// `Record` in the system satisfies the model invariants. Two records are
/// duplicates exactly when they compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub test_number: i64,
    pub build_date: NaiveDate,
    pub category: String,
    pub test_case: String,
    pub expected_result: String,
    pub actual_result: String,
    pub repeatable: Flag,
    pub blocker: Flag,
    pub test_owner: String,
}

impl Record {
    /// Cells in interchange order. `BuildDate` renders as `MM/DD/YYYY`.
    pub fn to_cells(&self) -> [String; 9] {
        [
            self.test_number.to_string(),
            crate::date::render_slash(self.build_date),
            self.category.clone(),
            self.test_case.clone(),
            self.expected_result.clone(),
            self.actual_result.clone(),
            self.repeatable.as_str().to_string(),
            self.blocker.as_str().to_string(),
            self.test_owner.clone(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A header row plus data rows, as read from any source.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Canonical columns with no matching header.
    pub fn missing_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| !self.headers.iter().any(|h| h.trim() == c.header()))
            .collect()
    }

    /// Map each canonical column to its position in `headers`.
    /// First occurrence wins when a header repeats.
    pub fn column_index(&self) -> HashMap<Column, usize> {
        let mut index = HashMap::new();
        for (i, h) in self.headers.iter().enumerate() {
            if let Some(col) = Column::from_header(h) {
                index.entry(col).or_insert(i);
            }
        }
        index
    }

    /// Project a data row onto the canonical columns. Cells past the end of a
    /// short row are absent (`None`), not empty.
    pub fn fields(&self, index: &HashMap<Column, usize>, row: usize) -> HashMap<Column, Option<String>> {
        let cells = self.rows.get(row).map(|r| r.as_slice()).unwrap_or(&[]);
        Column::ALL
            .into_iter()
            .map(|c| {
                let value = index.get(&c).and_then(|&i| cells.get(i)).cloned();
                (c, value)
            })
            .collect()
    }
}
