use chrono::NaiveDate;
use qaledger_core::Record;

use crate::error::ReconError;
use crate::model::CollectionKind;
use crate::store::{DateOrder, Filter, RecordStore};

/// Read-only queries over the personal and global collections.
///
/// Listing queries read the union of both collections and never return two
/// equal records. Ordinal queries read the global collection only.
pub struct QueryEngine<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> QueryEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn list_by_owner(&self, name: &str) -> Result<Vec<Record>, ReconError> {
        Ok(self.store.select_union_distinct(&Filter::Owner(name.to_string()))?)
    }

    pub fn list_repeatable(&self) -> Result<Vec<Record>, ReconError> {
        Ok(self.store.select_union_distinct(&Filter::Repeatable)?)
    }

    pub fn list_blocker(&self) -> Result<Vec<Record>, ReconError> {
        Ok(self.store.select_union_distinct(&Filter::Blocker)?)
    }

    pub fn list_by_build_date(&self, date: NaiveDate) -> Result<Vec<Record>, ReconError> {
        Ok(self.store.select_union_distinct(&Filter::BuildDate(date))?)
    }

    /// Every global row for `name`, duplicates included. Feeds the full-dump export.
    pub fn list_all_by_owner_from_global(&self, name: &str) -> Result<Vec<Record>, ReconError> {
        Ok(self
            .store
            .select(CollectionKind::Global, &Filter::Owner(name.to_string()))?)
    }

    /// Earliest build date; ties go to the earliest inserted row.
    pub fn first_by_build_date(&self) -> Result<Record, ReconError> {
        self.ordinal(DateOrder::Ascending, |_| 0)
    }

    /// Element at 1-indexed position `floor((n+1)/2)` of the ascending order:
    /// the median for odd `n`, the lower central element for even `n`.
    pub fn middle_by_build_date(&self) -> Result<Record, ReconError> {
        self.ordinal(DateOrder::Ascending, |n| (n + 1) / 2 - 1)
    }

    /// Latest build date; ties go to the latest inserted row, so this is
    /// always the final element of the order `first_by_build_date` starts.
    pub fn last_by_build_date(&self) -> Result<Record, ReconError> {
        self.ordinal(DateOrder::Descending, |_| 0)
    }

    /// Row counts per collection.
    pub fn collection_counts(&self) -> Result<Vec<(CollectionKind, usize)>, ReconError> {
        CollectionKind::ALL
            .into_iter()
            .map(|kind| -> Result<_, ReconError> { Ok((kind, self.store.count(kind)?)) })
            .collect()
    }

    fn ordinal(&self, order: DateOrder, position: impl Fn(usize) -> usize) -> Result<Record, ReconError> {
        let kind = CollectionKind::Global;
        let n = self.store.count(kind)?;
        if n == 0 {
            return Err(ReconError::EmptyCollection(kind));
        }
        self.store
            .nth_by_build_date(kind, order, position(n))?
            .ok_or(ReconError::EmptyCollection(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use qaledger_core::Flag;

    fn rec(n: i64, date: &str, owner: &str) -> Record {
        Record {
            test_number: n,
            build_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            category: "Online Match".into(),
            test_case: format!("case {n}"),
            expected_result: "works".into(),
            actual_result: "works".into(),
            repeatable: Flag::parse("no").unwrap(),
            blocker: Flag::parse("no").unwrap(),
            test_owner: owner.into(),
        }
    }

    fn global_store(records: &[Record]) -> MemoryStore {
        let mut store = MemoryStore::new();
        store.commit(CollectionKind::Global, records, false).unwrap();
        store
    }

    #[test]
    fn ordinals_on_five_dates() {
        let store = global_store(&[
            rec(1, "2024-01-01", "A"),
            rec(2, "2024-02-01", "A"),
            rec(3, "2024-03-01", "A"),
            rec(4, "2024-03-19", "A"),
            rec(5, "2024-04-01", "A"),
        ]);
        let q = QueryEngine::new(&store);
        assert_eq!(q.first_by_build_date().unwrap().test_number, 1);
        assert_eq!(q.middle_by_build_date().unwrap().test_number, 3);
        assert_eq!(q.last_by_build_date().unwrap().test_number, 5);
    }

    #[test]
    fn ordinals_ignore_insertion_order_of_dates() {
        let store = global_store(&[
            rec(4, "2024-03-19", "A"),
            rec(1, "2024-01-01", "A"),
            rec(5, "2024-04-01", "A"),
            rec(3, "2024-03-01", "A"),
            rec(2, "2024-02-01", "A"),
        ]);
        let q = QueryEngine::new(&store);
        assert_eq!(q.first_by_build_date().unwrap().test_number, 1);
        assert_eq!(q.middle_by_build_date().unwrap().test_number, 3);
        assert_eq!(q.last_by_build_date().unwrap().test_number, 5);
    }

    #[test]
    fn middle_of_even_count_is_lower_central() {
        let store = global_store(&[
            rec(1, "2024-01-01", "A"),
            rec(2, "2024-01-02", "A"),
            rec(3, "2024-01-03", "A"),
            rec(4, "2024-01-04", "A"),
        ]);
        assert_eq!(QueryEngine::new(&store).middle_by_build_date().unwrap().test_number, 2);
    }

    #[test]
    fn single_record_is_first_middle_and_last() {
        let store = global_store(&[rec(9, "2024-05-05", "A")]);
        let q = QueryEngine::new(&store);
        assert_eq!(q.first_by_build_date().unwrap().test_number, 9);
        assert_eq!(q.middle_by_build_date().unwrap().test_number, 9);
        assert_eq!(q.last_by_build_date().unwrap().test_number, 9);
    }

    #[test]
    fn tie_break_is_insertion_order_both_ways() {
        let store = global_store(&[
            rec(10, "2024-01-01", "A"),
            rec(11, "2024-01-01", "A"),
            rec(20, "2024-06-01", "A"),
            rec(21, "2024-06-01", "A"),
        ]);
        let q = QueryEngine::new(&store);
        assert_eq!(q.first_by_build_date().unwrap().test_number, 10);
        assert_eq!(q.last_by_build_date().unwrap().test_number, 21);
    }

    #[test]
    fn ordinal_on_empty_global_errors() {
        let mut store = MemoryStore::new();
        store
            .commit(CollectionKind::Personal, &[rec(1, "2024-01-01", "A")], false)
            .unwrap();
        let q = QueryEngine::new(&store);
        for result in [q.first_by_build_date(), q.middle_by_build_date(), q.last_by_build_date()] {
            assert!(matches!(result, Err(ReconError::EmptyCollection(CollectionKind::Global))));
        }
    }

    #[test]
    fn owner_match_is_case_sensitive() {
        let store = global_store(&[rec(1, "2024-01-01", "Kevin Chaja"), rec(2, "2024-01-01", "kevin chaja")]);
        let q = QueryEngine::new(&store);
        assert_eq!(q.list_by_owner("Kevin Chaja").unwrap().len(), 1);
        assert_eq!(q.list_all_by_owner_from_global("Kevin Chaja").unwrap().len(), 1);
    }

    #[test]
    fn counts_per_collection() {
        let store = global_store(&[rec(1, "2024-01-01", "A"), rec(2, "2024-01-02", "A")]);
        let counts = QueryEngine::new(&store).collection_counts().unwrap();
        assert_eq!(counts, vec![(CollectionKind::Personal, 0), (CollectionKind::Global, 2)]);
    }
}
