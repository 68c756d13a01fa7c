//! The store contract the ingestion pipelines and query engine rely on, plus
//! an in-memory implementation over explicit [`Collection`] handles.

use std::collections::HashSet;

use chrono::NaiveDate;
use qaledger_core::Record;

use crate::error::StoreError;
use crate::model::{Collection, CollectionKind};

/// Equality predicates supported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Exact, case-sensitive owner match.
    Owner(String),
    /// `Repeatable?` is "yes" in any casing.
    Repeatable,
    /// `Blocker?` is "yes" in any casing.
    Blocker,
    BuildDate(NaiveDate),
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Owner(name) => record.test_owner == *name,
            Self::Repeatable => record.repeatable.is_yes(),
            Self::Blocker => record.blocker.is_yes(),
            Self::BuildDate(date) => record.build_date == *date,
        }
    }
}

/// Build-date ordering. Ties always fall back to insertion order in the same
/// direction, so `Descending` is the exact reverse of `Ascending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    Ascending,
    Descending,
}

pub trait RecordStore {
    /// Append `records` to `kind` as one all-or-nothing batch. With `replace`
    /// the collection is emptied first, inside the same batch.
    fn commit(&mut self, kind: CollectionKind, records: &[Record], replace: bool) -> Result<usize, StoreError>;

    fn count(&self, kind: CollectionKind) -> Result<usize, StoreError>;

    /// Matching records from one collection, insertion order, duplicates kept.
    fn select(&self, kind: CollectionKind, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    /// Matching records from both collections with duplicates removed.
    /// Personal records come first, then Global, each in insertion order;
    /// of a set of duplicates the first one encountered is kept.
    fn select_union_distinct(&self, filter: &Filter) -> Result<Vec<Record>, StoreError>;

    /// The record at 0-based `position` after ordering `kind` by build date.
    fn nth_by_build_date(
        &self,
        kind: CollectionKind,
        order: DateOrder,
        position: usize,
    ) -> Result<Option<Record>, StoreError>;
}

/// Keep the first occurrence of each record, preserving order.
pub fn dedup<I>(records: I) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MemoryStore {
    personal: Collection,
    global: Collection,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            personal: Collection::new(CollectionKind::Personal),
            global: Collection::new(CollectionKind::Global),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the two ingested collections.
    pub fn from_collections(personal: Collection, global: Collection) -> Result<Self, StoreError> {
        if personal.kind() != CollectionKind::Personal || global.kind() != CollectionKind::Global {
            return Err(StoreError::Open("collections passed in the wrong slots".into()));
        }
        Ok(Self { personal, global })
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        match kind {
            CollectionKind::Personal => &self.personal,
            CollectionKind::Global => &self.global,
        }
    }

    fn collection_mut(&mut self, kind: CollectionKind) -> &mut Collection {
        match kind {
            CollectionKind::Personal => &mut self.personal,
            CollectionKind::Global => &mut self.global,
        }
    }
}

impl RecordStore for MemoryStore {
    fn commit(&mut self, kind: CollectionKind, records: &[Record], replace: bool) -> Result<usize, StoreError> {
        let target = self.collection_mut(kind);
        if replace {
            *target = Collection::new(kind);
        }
        for record in records {
            target.push(record.clone());
        }
        Ok(records.len())
    }

    fn count(&self, kind: CollectionKind) -> Result<usize, StoreError> {
        Ok(self.collection(kind).len())
    }

    fn select(&self, kind: CollectionKind, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .collection(kind)
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn select_union_distinct(&self, filter: &Filter) -> Result<Vec<Record>, StoreError> {
        let both = self
            .personal
            .iter()
            .chain(self.global.iter())
            .filter(|r| filter.matches(r))
            .cloned();
        Ok(dedup(both))
    }

    fn nth_by_build_date(
        &self,
        kind: CollectionKind,
        order: DateOrder,
        position: usize,
    ) -> Result<Option<Record>, StoreError> {
        let mut ranked: Vec<(usize, &Record)> = self.collection(kind).iter().enumerate().collect();
        ranked.sort_by_key(|(seq, r)| (r.build_date, *seq));
        if order == DateOrder::Descending {
            ranked.reverse();
        }
        Ok(ranked.get(position).map(|(_, r)| (*r).clone()))
    }
}
