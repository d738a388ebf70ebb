//! Postgres store tests. They need a live database and are skipped unless
//! `DATABASE_URL` is set.

use basket_blob::SourceRef;
use basket_store::{File, FileStore, PgFileStore, StoreError};
use chrono::{Duration, SubsecRound, Utc};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn postgres_or_skip() -> Option<PgFileStore> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("Skipping PostgreSQL test: DATABASE_URL not set");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .unwrap_or_else(|e| panic!("PostgreSQL test setup failed: {e}"));
    let store = PgFileStore::new(pool);
    store.migrate().await.expect("migrations");
    Some(store)
}

fn file(source_ref: &SourceRef) -> File {
    // TIMESTAMPTZ keeps microseconds
    let now = Utc::now().trunc_subsecs(6);
    File {
        id: Uuid::new_v4(),
        source_ref: source_ref.clone(),
        title: "report".to_string(),
        name: "report.v2.csv".to_string(),
        description: String::new(),
        size: 2048,
        download_count: 0,
        created_at: now,
        updated_at: now,
    }
}

fn unique_ref() -> SourceRef {
    SourceRef::new(format!("pg-test-{}", Uuid::new_v4().simple()))
}

#[tokio::test]
async fn create_then_get_returns_same_record() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let f = file(&unique_ref());

    store.create(&f).await.unwrap();
    assert_eq!(store.get(f.id).await.unwrap(), f);

    store.delete(f.id).await.unwrap();
}

#[tokio::test]
async fn duplicate_id_is_conflict() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let f = file(&unique_ref());

    store.create(&f).await.unwrap();
    let err = store.create(&f).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(id) if id == f.id));

    store.delete(f.id).await.unwrap();
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    assert!(store.get(Uuid::new_v4()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_rewrites_only_mutable_columns() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let original = file(&unique_ref());
    store.create(&original).await.unwrap();

    let mut changed = original.clone();
    changed.description = "quarterly".to_string();
    changed.download_count = 2;
    changed.updated_at = original.updated_at + Duration::seconds(1);
    changed.size = 1;
    store.update(&changed).await.unwrap();

    let stored = store.get(original.id).await.unwrap();
    assert_eq!(stored.description, "quarterly");
    assert_eq!(stored.download_count, 0);
    assert_eq!(stored.updated_at, changed.updated_at);
    assert_eq!(stored.size, original.size);
    assert_eq!(stored.created_at, original.created_at);

    store.delete(original.id).await.unwrap();
}

#[tokio::test]
async fn concurrent_record_download_counts_every_call() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let f = file(&unique_ref());
    store.create(&f).await.unwrap();

    let at = f.updated_at + Duration::seconds(2);
    let (a, b) = tokio::join!(store.record_download(f.id, at), store.record_download(f.id, at));
    a.unwrap();
    b.unwrap();

    let stored = store.get(f.id).await.unwrap();
    assert_eq!(stored.download_count, 2);
    assert_eq!(stored.updated_at, at);
    assert_eq!(stored.title, f.title);

    store.delete(f.id).await.unwrap();
}

#[tokio::test]
async fn record_download_missing_is_not_found() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let err = store.record_download(Uuid::new_v4(), Utc::now()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_missing_is_not_found() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let err = store.update(&file(&unique_ref())).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn remove_and_check_ref_tracks_shared_blob() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let shared = unique_ref();
    let a = file(&shared);
    let b = file(&shared);
    store.create(&a).await.unwrap();
    store.create(&b).await.unwrap();

    assert!(store.exists_by_ref(&shared).await.unwrap());
    assert!(store.remove_and_check_ref(&a).await.unwrap());
    assert!(!store.remove_and_check_ref(&b).await.unwrap());
    assert!(!store.exists_by_ref(&shared).await.unwrap());
}

#[tokio::test]
async fn concurrent_removal_of_last_two_refs_reports_one_orphan() {
    let Some(store) = postgres_or_skip().await else {
        return;
    };
    let shared = unique_ref();
    let a = file(&shared);
    let b = file(&shared);
    store.create(&a).await.unwrap();
    store.create(&b).await.unwrap();

    let (ra, rb) = tokio::join!(store.remove_and_check_ref(&a), store.remove_and_check_ref(&b));
    let remaining = [ra.unwrap(), rb.unwrap()];
    assert_eq!(remaining.iter().filter(|still| !**still).count(), 1);
}
