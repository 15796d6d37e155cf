use std::collections::BTreeMap;
use std::sync::Arc;

use quiz_core::model::{OptionId, QuestionId, QuestionStatus, SessionSnapshot, WrongAnswerRecord};
use quiz_core::time::fixed_now;
use storage::repository::KeyValueStore;
use storage::sqlite::SqliteKeyValueStore;
use storage::{LOCAL_SNAPSHOT_KEY, LocalSnapshotBackend, SnapshotBackend};

async fn connect(name: &str) -> SqliteKeyValueStore {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let store = SqliteKeyValueStore::connect(&url).await.expect("connect");
    store.migrate().await.expect("migrate");
    store
}

#[tokio::test]
async fn sqlite_key_value_upserts_and_removes() {
    let store = connect("memdb_kv").await;

    assert_eq!(store.get("missing").await.unwrap(), None);

    store.set("k", "first").await.unwrap();
    store.set("k", "second").await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));

    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let store = connect("memdb_migrate_twice").await;
    store.set("k", "v").await.unwrap();

    store.migrate().await.expect("second migrate");
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_backs_local_snapshot() {
    let store = connect("memdb_snapshot").await;
    let backend = LocalSnapshotBackend::new(Arc::new(store.clone()));

    let mut status = BTreeMap::new();
    status.insert(QuestionId::new(4), QuestionStatus::Wrong);
    let snapshot = SessionSnapshot {
        question_order: vec![QuestionId::new(4), QuestionId::new(2)],
        current_index: 1,
        answered_count: 1,
        correct_count: 0,
        wrong_count: 1,
        question_status_map: status,
        wrong_answers: vec![WrongAnswerRecord {
            question_id: QuestionId::new(4),
            selected_answers: vec![OptionId::new("a"), OptionId::new("d")],
        }],
        flagged_questions: vec![QuestionId::new(2)],
        saved_at: Some(fixed_now()),
    };

    backend.save(None, &snapshot).await.unwrap();
    let raw = store.get(LOCAL_SNAPSHOT_KEY).await.unwrap().unwrap();
    assert!(raw.contains("\"questionOrder\":[4,2]"));

    let loaded = backend.load(None).await.unwrap().unwrap();
    assert_eq!(loaded, snapshot);

    backend.clear(None).await.unwrap();
    assert_eq!(backend.load(None).await.unwrap(), None);
}
