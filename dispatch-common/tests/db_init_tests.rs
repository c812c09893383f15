//! Tests for database initialization
//!
//! Covers first-run creation, reopening an existing database, migration
//! bookkeeping and default pick-list seeding.

use dispatch_common::db::init::init_database;
use dispatch_common::profile::ListKind;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("dispatch.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dispatch.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_migrations_recorded_once() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dispatch.db");

    let pool = init_database(&db_path).await.unwrap();
    pool.close().await;
    let pool = init_database(&db_path).await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn test_default_lists_seeded() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("dispatch.db")).await.unwrap();

    for kind in ListKind::ALL {
        let items: Vec<String> = sqlx::query_scalar(
            "SELECT item FROM list_items WHERE list_name = ? ORDER BY position",
        )
        .bind(kind.as_str())
        .fetch_all(&pool)
        .await
        .unwrap();

        let expected: Vec<String> = kind.defaults().iter().map(|s| s.to_string()).collect();
        assert_eq!(items, expected, "Unexpected seed for {}", kind.as_str());
    }
}

#[tokio::test]
async fn test_user_removed_list_item_not_reseeded_on_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("dispatch.db");

    let pool = init_database(&db_path).await.unwrap();
    sqlx::query("DELETE FROM list_items WHERE list_name = 'vehicleTypes' AND item = 'Lorry'")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM list_items WHERE list_name = 'vehicleTypes' AND item = 'Lorry'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}
