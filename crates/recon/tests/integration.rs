use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;
use qaledger_core::{Column, RawTable, RejectReason};
use qaledger_recon::{
    commit, ingest_trusted, ingest_untrusted, CollectionKind, MemoryStore, QueryEngine, RecordStore,
};

fn headers() -> Vec<String> {
    Column::headers().iter().map(|h| h.to_string()).collect()
}

fn row(cells: [&str; 9]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn load(personal: Vec<Vec<String>>, global: Vec<Vec<String>>) -> MemoryStore {
    let p = ingest_trusted(&RawTable::new(headers(), personal)).unwrap();
    let g = ingest_untrusted(&RawTable::new(headers(), global)).unwrap();
    MemoryStore::from_collections(p.collection, g.collection).unwrap()
}

// -------------------------------------------------------------------------
// Ingestion scenarios
// -------------------------------------------------------------------------

#[test]
fn mixed_validity_untrusted_ingestion() {
    let table = RawTable::new(
        headers(),
        vec![
            row(["1", "2024-03-19 00:00:00", "Tutorial", "Skip", "Skips", "Skips", "no", "no", "Kevin Chaja"]),
            row(["2", "2024-03-19 00:00:00", "Tutorial", "Pause", "Pauses", "Crash", "yes", "maybe", "Kevin Chaja"]),
            row(["3", "2024-03-20 00:00:00", "Main Page", "Load", "Loads", "Loads", "No", "No", "Kevin Chaja"]),
            row(["4", "2024-03-21 00:00:00", "", "Quit", "Quits", "Quits", "no", "no", "Kevin Chaja"]),
        ],
    );
    let out = ingest_untrusted(&table).unwrap();

    let stored: Vec<i64> = out.collection.iter().map(|r| r.test_number).collect();
    assert_eq!(stored, vec![1, 3]);

    assert_eq!(out.skipped.len(), 2);
    assert_eq!(out.skipped[0].row, 2);
    assert_eq!(out.skipped[0].error.column(), Column::Blocker.header());
    assert_eq!(out.skipped[1].row, 4);
    assert_eq!(out.skipped[1].error.column(), Column::Category.header());
    assert_eq!(out.skipped[1].error.reason(), &RejectReason::Empty);
}

#[test]
fn untrusted_rejects_every_invalid_shape() {
    let table = RawTable::new(
        headers(),
        vec![
            row(["x1", "2024-03-19 00:00:00", "c", "t", "e", "a", "no", "no", "O"]),
            row(["1.5", "2024-03-19 00:00:00", "c", "t", "e", "a", "no", "no", "O"]),
            row(["2", "NaT", "c", "t", "e", "a", "no", "no", "O"]),
            row(["3", "2024-3-19 00:00:00", "c", "t", "e", "a", "no", "no", "O"]),
            row(["4", "2024-03-19 00:00:00", "c", "t", "e", "a", "Y", "no", "O"]),
            row(["5", "2024-03-19 00:00:00", "c", "t", "e", "a", "no", "no", ""]),
        ],
    );
    let out = ingest_untrusted(&table).unwrap();
    assert!(out.collection.is_empty());
    assert_eq!(out.skipped.iter().map(|s| s.row).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn failed_batch_commits_nothing() {
    let mut store = MemoryStore::new();
    let mut h = headers();
    h.pop();
    let result = ingest_trusted(&RawTable::new(h, vec![row(["1", "03/19/2024", "c", "t", "e", "a", "no", "no", "O"])]));
    assert!(result.is_err());
    assert_eq!(store.count(CollectionKind::Personal).unwrap(), 0);

    // A good batch afterwards is unaffected
    let ok = ingest_trusted(&RawTable::new(headers(), vec![row(["1", "03/19/2024", "c", "t", "e", "a", "no", "no", "O"])])).unwrap();
    commit(&mut store, &ok, false).unwrap();
    assert_eq!(store.count(CollectionKind::Personal).unwrap(), 1);
}

#[test]
fn replace_makes_reingestion_idempotent() {
    let mut store = MemoryStore::new();
    let batch = ingest_trusted(&RawTable::new(
        headers(),
        vec![row(["1", "03/19/2024", "c", "t", "e", "a", "no", "no", "O"])],
    ))
    .unwrap();
    commit(&mut store, &batch, false).unwrap();
    commit(&mut store, &batch, false).unwrap();
    assert_eq!(store.count(CollectionKind::Personal).unwrap(), 2);

    commit(&mut store, &batch, true).unwrap();
    assert_eq!(store.count(CollectionKind::Personal).unwrap(), 1);
}

#[test]
fn store_from_ingested_collections() {
    let p = ingest_trusted(&RawTable::new(
        headers(),
        vec![row(["1", "03/19/2024", "c", "t", "e", "a", "no", "no", "O"])],
    ))
    .unwrap();
    let g = ingest_untrusted(&RawTable::new(
        headers(),
        vec![
            row(["2", "2024-03-20 00:00:00", "c", "t", "e", "a", "no", "no", "O"]),
            row(["3", "2024-03-21 00:00:00", "c", "t", "e", "a", "no", "no", "O"]),
        ],
    ))
    .unwrap();

    // Collections handed over in the wrong slots are refused
    assert!(MemoryStore::from_collections(g.collection.clone(), p.collection.clone()).is_err());

    let store = MemoryStore::from_collections(p.collection, g.collection).unwrap();
    assert_eq!(store.count(CollectionKind::Personal).unwrap(), 1);
    assert_eq!(store.count(CollectionKind::Global).unwrap(), 2);
}

// -------------------------------------------------------------------------
// Query scenarios
// -------------------------------------------------------------------------

#[test]
fn cross_source_union_filter() {
    let store = load(
        vec![row(["1", "03/19/2024", "Lobby", "Join", "Joins", "Fails", "Yes", "no", "A"])],
        vec![
            row(["1", "2024-03-19 00:00:00", "Lobby", "Join", "Joins", "Fails", "yes", "No", "A"]),
            row(["2", "2024-03-19 00:00:00", "Lobby", "Leave", "Leaves", "Leaves", "no", "no", "A"]),
        ],
    );
    let q = QueryEngine::new(&store);

    let repeatable = q.list_repeatable().unwrap();
    assert_eq!(repeatable.len(), 1);
    // Personal copy is encountered first and keeps its casing
    assert_eq!(repeatable[0].repeatable.as_str(), "Yes");

    assert_eq!(q.list_by_owner("A").unwrap().len(), 2);
    assert_eq!(q.list_by_build_date(date("2024-03-19")).unwrap().len(), 2);
    assert!(q.list_blocker().unwrap().is_empty());
}

#[test]
fn owner_export_is_unfiltered() {
    let shared = ["7", "03/19/2024", "Store", "Buy", "Bought", "Bought", "no", "yes", "Kevin Chaja"];
    let shared_global = ["7", "2024-03-19 00:00:00", "Store", "Buy", "Bought", "Bought", "no", "yes", "Kevin Chaja"];
    let store = load(
        vec![row(shared)],
        vec![
            row(shared_global),
            row(shared_global),
            row(["8", "2024-03-20 00:00:00", "Store", "Sell", "Sold", "Sold", "no", "no", "Kevin Chaja"]),
            row(["9", "2024-03-20 00:00:00", "Store", "Sell", "Sold", "Sold", "no", "no", "Someone Else"]),
        ],
    );
    let q = QueryEngine::new(&store);

    let all = q.list_all_by_owner_from_global("Kevin Chaja").unwrap();
    assert_eq!(all.iter().map(|r| r.test_number).collect::<Vec<_>>(), vec![7, 7, 8]);

    // The deduplicated listing collapses the three copies of #7
    assert_eq!(q.list_by_owner("Kevin Chaja").unwrap().len(), 2);
}

#[test]
fn ordinal_consistency_fixture() {
    let dates = ["2024-01-01", "2024-02-01", "2024-03-01", "2024-03-19", "2024-04-01"];
    let global = dates
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let n = (i + 1).to_string();
            let dt = format!("{d} 00:00:00");
            row([n.as_str(), dt.as_str(), "c", "t", "e", "a", "no", "no", "O"])
        })
        .collect();
    let store = load(vec![], global);
    let q = QueryEngine::new(&store);

    assert_eq!(q.first_by_build_date().unwrap().build_date, date("2024-01-01"));
    assert_eq!(q.middle_by_build_date().unwrap().build_date, date("2024-03-01"));
    assert_eq!(q.last_by_build_date().unwrap().build_date, date("2024-04-01"));
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

fn arb_cells() -> impl Strategy<Value = Vec<String>> {
    (
        1i64..4,
        prop_oneof![Just("03/19/2024"), Just("3/20/24"), Just("2024-03-19 08:00:00")],
        prop_oneof![Just("Tutorial"), Just("Lobby")],
        prop_oneof![Just("yes"), Just("Yes"), Just("no"), Just("NO")],
        prop_oneof![Just("yes"), Just("no")],
        prop_oneof![Just("A"), Just("B")],
    )
        .prop_map(|(n, d, cat, rep, blk, owner)| {
            vec![
                n.to_string(),
                d.to_string(),
                cat.to_string(),
                "case".to_string(),
                "expected".to_string(),
                "actual".to_string(),
                rep.to_string(),
                blk.to_string(),
                owner.to_string(),
            ]
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn dedup_queries_are_idempotent_and_distinct(
        personal in prop::collection::vec(arb_cells(), 0..12),
        global in prop::collection::vec(arb_cells(), 0..12),
    ) {
        let store = load(personal, global);
        let q = QueryEngine::new(&store);

        let runs = [
            q.list_by_owner("A").unwrap(),
            q.list_repeatable().unwrap(),
            q.list_blocker().unwrap(),
            q.list_by_build_date(date("2024-03-19")).unwrap(),
        ];
        let again = [
            q.list_by_owner("A").unwrap(),
            q.list_repeatable().unwrap(),
            q.list_blocker().unwrap(),
            q.list_by_build_date(date("2024-03-19")).unwrap(),
        ];

        for (first, second) in runs.iter().zip(again.iter()) {
            prop_assert_eq!(first, second);
            let distinct: HashSet<_> = first.iter().collect();
            prop_assert_eq!(distinct.len(), first.len());
        }
    }
}
