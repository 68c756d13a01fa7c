//! SQLite-backed record store.
//!
//! Both collections live in one database file as tables of identical shape.
//! `seq` is the insertion order, used for first-occurrence dedup and for the
//! build-date tie-break. Build dates are stored as ISO `YYYY-MM-DD` text, so
//! text ordering is date ordering.

use std::path::Path;

use chrono::NaiveDate;
use qaledger_core::{Flag, Record};
use qaledger_recon::{CollectionKind, DateOrder, Filter, RecordStore, StoreError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

const COLUMNS: &str = "test_number, build_date, category, test_case, expected_result, \
                       actual_result, repeatable, blocker, test_owner";

const UNION_LABEL: &str = "PersonalCollection+GlobalCollection";

fn schema(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    test_number INTEGER NOT NULL CHECK (test_number > 0),
    build_date DATE NOT NULL,                  -- YYYY-MM-DD text
    category TEXT NOT NULL,
    test_case TEXT NOT NULL,
    expected_result TEXT NOT NULL,
    actual_result TEXT NOT NULL,
    repeatable TEXT NOT NULL CHECK (lower(repeatable) IN ('yes', 'no')),
    blocker TEXT NOT NULL CHECK (lower(blocker) IN ('yes', 'no')),
    test_owner TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {table}_build_date ON {table} (build_date, seq);
"#
    )
}

/// WHERE clause and its single optional parameter (`?1`).
fn filter_clause(filter: &Filter) -> (&'static str, Option<Value>) {
    match filter {
        Filter::All => ("1 = 1", None),
        Filter::Owner(name) => ("test_owner = ?1", Some(Value::Text(name.clone()))),
        Filter::Repeatable => ("lower(repeatable) = 'yes'", None),
        Filter::Blocker => ("lower(blocker) = 'yes'", None),
        Filter::BuildDate(date) => ("build_date = ?1", Some(Value::Text(iso(*date)))),
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

type RawRow = (i64, NaiveDate, String, String, String, String, String, String, String);

fn to_record(raw: RawRow, table: &'static str) -> Result<Record, StoreError> {
    let (test_number, build_date, category, test_case, expected_result, actual_result, repeatable, blocker, test_owner) =
        raw;
    let corrupt = |message: String| StoreError::Corrupt { table, message };

    if test_number <= 0 {
        return Err(corrupt(format!("non-positive test number {}", test_number)));
    }
    let repeatable = Flag::parse(&repeatable).ok_or_else(|| corrupt(format!("invalid repeatable flag '{}'", repeatable)))?;
    let blocker = Flag::parse(&blocker).ok_or_else(|| corrupt(format!("invalid blocker flag '{}'", blocker)))?;

    Ok(Record {
        test_number,
        build_date,
        category,
        test_case,
        expected_result,
        actual_result,
        repeatable,
        blocker,
        test_owner,
    })
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store file. Missing tables are created.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        for kind in CollectionKind::ALL {
            conn.execute_batch(&schema(kind.table_name()))
                .map_err(|e| StoreError::Open(e.to_string()))?;
        }
        Ok(Self { conn })
    }

    fn read_rows<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
        table: &'static str,
    ) -> Result<Vec<Record>, StoreError> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| StoreError::Query(e.to_string()))?;
        let rows = stmt
            .query_map(params, |row| -> rusqlite::Result<RawRow> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            })
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut records = Vec::new();
        for raw in rows {
            let raw = raw.map_err(|e| StoreError::Corrupt { table, message: e.to_string() })?;
            records.push(to_record(raw, table)?);
        }
        Ok(records)
    }
}

impl RecordStore for SqliteStore {
    fn commit(&mut self, kind: CollectionKind, records: &[Record], replace: bool) -> Result<usize, StoreError> {
        let table = kind.table_name();
        let tx = self.conn.transaction().map_err(|e| StoreError::Commit(e.to_string()))?;

        if replace {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .map_err(|e| StoreError::Commit(e.to_string()))?;
        }

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {table} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ))
                .map_err(|e| StoreError::Commit(e.to_string()))?;

            for r in records {
                stmt.execute(params![
                    r.test_number,
                    r.build_date,
                    r.category,
                    r.test_case,
                    r.expected_result,
                    r.actual_result,
                    r.repeatable.as_str(),
                    r.blocker.as_str(),
                    r.test_owner,
                ])
                .map_err(|e| StoreError::Commit(format!("test #{}: {}", r.test_number, e)))?;
            }
        }

        // An uncommitted transaction rolls back on drop
        tx.commit().map_err(|e| StoreError::Commit(e.to_string()))?;
        Ok(records.len())
    }

    fn count(&self, kind: CollectionKind) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", kind.table_name()), [], |row| row.get(0))
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(n as usize)
    }

    fn select(&self, kind: CollectionKind, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let table = kind.table_name();
        let (clause, param) = filter_clause(filter);
        let sql = format!("SELECT {COLUMNS} FROM {table} WHERE {clause} ORDER BY seq");
        self.read_rows(&sql, params_from_iter(param.iter()), table)
    }

    fn select_union_distinct(&self, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let (clause, param) = filter_clause(filter);
        let personal = CollectionKind::Personal.table_name();
        let global = CollectionKind::Global.table_name();

        // Flags compare case-insensitively, everything else exactly. The
        // earliest copy (Personal before Global, then by seq) survives.
        let sql = format!(
            "SELECT {COLUMNS} FROM (
                SELECT {COLUMNS}, src, seq, ROW_NUMBER() OVER (
                    PARTITION BY test_number, build_date, category, test_case, expected_result,
                                 actual_result, lower(repeatable), lower(blocker), test_owner
                    ORDER BY src, seq
                ) AS rn
                FROM (
                    SELECT {COLUMNS}, 0 AS src, seq FROM {personal} WHERE {clause}
                    UNION ALL
                    SELECT {COLUMNS}, 1 AS src, seq FROM {global} WHERE {clause}
                )
            )
            WHERE rn = 1
            ORDER BY src, seq"
        );
        self.read_rows(&sql, params_from_iter(param.iter()), UNION_LABEL)
    }

    fn nth_by_build_date(
        &self,
        kind: CollectionKind,
        order: DateOrder,
        position: usize,
    ) -> Result<Option<Record>, StoreError> {
        let table = kind.table_name();
        let direction = match order {
            DateOrder::Ascending => "ASC",
            DateOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT {COLUMNS} FROM {table} ORDER BY build_date {direction}, seq {direction} LIMIT 1 OFFSET ?1"
        );
        let mut rows = self.read_rows(&sql, params![position as i64], table)?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }
}
