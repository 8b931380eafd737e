//! Snapshot persistence on disk

use std::collections::BTreeMap;
use tempfile::TempDir;
use terminal_scraper::model::{LocationResult, ScrapeData, TableRecord};
use terminal_scraper::storage::{open_storage, Storage};
use terminal_scraper::Portal;

#[test]
fn test_snapshot_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("snapshots.db");

    let mut locations = BTreeMap::new();
    locations.insert(
        "LAX".to_string(),
        LocationResult::succeeded(
            "LAX",
            "Los Angeles",
            None,
            vec![],
            vec![TableRecord::new(
                vec!["Col1".to_string(), "Col2".to_string()],
                vec![vec!["A".to_string(), "B".to_string()]],
            )],
        ),
    );
    let data = ScrapeData::Locations(locations);

    {
        let mut storage = open_storage(&db_path).unwrap();
        storage.save_snapshot(Portal::EtsLink, &data).unwrap();
    }

    let storage = open_storage(&db_path).unwrap();
    let snapshot = storage.latest_snapshot(Portal::EtsLink).unwrap().unwrap();
    assert_eq!(snapshot.portal, "etslink");
    assert_eq!(snapshot.data, data);
    assert!(storage.latest_snapshot(Portal::T18).unwrap().is_none());
}
