use chrono::Duration;
use quiz_core::model::{QuestionId, QuizResult, SavedProgress};
use quiz_core::time::fixed_now;
use storage::repository::{
    KeyValueRepository, KeyValueStore, ProgressRepository, Storage, keys,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_kv_set_overwrites_and_remove_is_idempotent() {
    let repo = connect("memdb_kv_basic").await;

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set("k", "1").await.unwrap();
    repo.set("k", "2").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("2"));

    repo.remove("k").await.unwrap();
    repo.remove("k").await.unwrap();
    assert_eq!(repo.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_migrations_can_run_twice() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.set(keys::SCORE, "3").await.unwrap();
    assert_eq!(repo.get(keys::SCORE).await.unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn sqlite_progress_survives_reconnect() {
    let first = connect("memdb_progress_reconnect").await;
    let typed = KeyValueRepository::new(std::sync::Arc::new(first.clone()));

    let progress = SavedProgress {
        question_ids: vec![QuestionId::new("q3"), QuestionId::new("q1")],
        current_index: 1,
        score: 1,
        started: true,
        selected_index: None,
    };
    typed.save_progress(&progress).await.unwrap();

    // A second pool on the same shared in-memory database sees the same rows.
    let second = connect("memdb_progress_reconnect").await;
    let reopened = KeyValueRepository::new(std::sync::Arc::new(second));
    assert_eq!(reopened.load_progress().await.unwrap(), Some(progress));

    reopened.clear_progress().await.unwrap();
    assert_eq!(typed.load_progress().await.unwrap(), None);
    drop(first);
}

#[tokio::test]
async fn sqlite_storage_keeps_history_order() {
    let storage = Storage::sqlite("sqlite:file:memdb_history?mode=memory&cache=shared")
        .await
        .expect("storage");

    let now = fixed_now();
    let history = vec![
        QuizResult::new(now + Duration::minutes(10), 8, 10).unwrap(),
        QuizResult::new(now, 5, 10).unwrap(),
    ];
    storage.history.save_history(&history).await.unwrap();

    let loaded = storage.history.load_history().await.unwrap();
    assert_eq!(loaded, history);
    assert_eq!(loaded[0].percentage(), 80);
}
