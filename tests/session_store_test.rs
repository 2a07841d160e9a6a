//! Session and progress persistence against the on-disk store

use std::sync::Arc;

use ragsync::progress::{ProgressCache, ProgressDetails, ProgressSnapshot, Stage, Status};
use ragsync::session::{ManualClock, SessionManager, DEFAULT_SESSION_TTL_MS};
use ragsync::storage::keys::{progress_key, LAST_ACTIVITY, SESSION_ID};
use ragsync::storage::{LocalStore, SledStore};

mod common;

const T0: i64 = 1_700_000_000_000;

#[test]
fn test_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state");
    let clock = Arc::new(ManualClock::new(T0));

    let token = {
        let store = SledStore::open(&path).unwrap();
        SessionManager::new(Arc::new(store), clock.clone())
            .resolve_session()
            .unwrap()
    };

    clock.advance(5 * 60 * 1000);
    let store = SledStore::open(&path).unwrap();
    let again = SessionManager::new(Arc::new(store), clock)
        .resolve_session()
        .unwrap();

    assert_eq!(again, token);
}

#[test]
fn test_snapshot_round_trips_through_disk_with_details() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state");
    let details: ProgressDetails = serde_json::from_value(serde_json::json!({
        "filename": "report.pdf",
        "elements_count": 120,
        "element_types": {"Title": 4, "NarrativeText": 100, "Table": 16},
        "chunks_count": 32,
        "server_extra": {"kept": true}
    }))
    .unwrap();
    let snapshot =
        ProgressSnapshot::new(Stage::Chunking, Status::Processing, 55, "Chunking").with_details(details);

    {
        let cache = ProgressCache::new(Arc::new(SledStore::open(&path).unwrap()));
        cache.save("tok", &snapshot).unwrap();
    }

    let cache = ProgressCache::new(Arc::new(SledStore::open(&path).unwrap()));
    let loaded = cache.load("tok").expect("snapshot persisted");
    assert_eq!(loaded, snapshot);
    assert_eq!(
        loaded.details.unwrap().extra.get("server_extra"),
        Some(&serde_json::json!({"kept": true}))
    );
}

#[test]
fn test_expired_session_discards_token_and_progress() {
    let (store, _dir) = common::create_temp_store();
    let store = Arc::new(store);
    let now = T0 + 2 * DEFAULT_SESSION_TTL_MS;
    store.set(SESSION_ID, "T1").unwrap();
    store.set(LAST_ACTIVITY, &T0.to_string()).unwrap();
    let cache = ProgressCache::new(store.clone());
    cache
        .save(
            "T1",
            &ProgressSnapshot::new(Stage::Vectorization, Status::Processing, 80, ""),
        )
        .unwrap();

    let sessions = SessionManager::new(store.clone(), Arc::new(ManualClock::new(now)));
    let token = sessions.resolve_session().unwrap();

    assert_ne!(token, "T1");
    assert!(store.get(&progress_key("T1")).unwrap().is_none());
    assert_eq!(store.get(SESSION_ID).unwrap(), Some(token));
    assert_eq!(store.get(LAST_ACTIVITY).unwrap(), Some(now.to_string()));
}

#[test]
fn test_malformed_stored_progress_is_absent() {
    let (store, _dir) = common::create_temp_store();
    store.set(&progress_key("tok"), "{\"stage\":").unwrap();

    let cache = ProgressCache::new(Arc::new(store));
    assert!(cache.load("tok").is_none());
}

#[test]
fn test_reset_replaces_token_and_clears_progress() {
    let (store, _dir) = common::create_temp_store();
    let store = Arc::new(store);
    let sessions = SessionManager::new(store.clone(), Arc::new(ManualClock::new(T0)));
    let first = sessions.resolve_session().unwrap();
    sessions
        .cache()
        .save(
            &first,
            &ProgressSnapshot::new(Stage::Completed, Status::Completed, 100, "done"),
        )
        .unwrap();

    let second = sessions.reset_session().unwrap();

    assert_ne!(first, second);
    assert!(sessions.cache().load(&first).is_none());
    assert_eq!(sessions.current().unwrap(), Some(second));
}
