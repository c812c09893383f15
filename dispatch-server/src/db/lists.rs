//! Pick-list database operations

use dispatch_common::profile::{normalize_list_item, ListKind};
use dispatch_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Entries of one list in insertion order
pub async fn get_list(db: &SqlitePool, kind: ListKind) -> Result<Vec<String>> {
    let items = sqlx::query_scalar(
        "SELECT item FROM list_items WHERE list_name = ? ORDER BY position, rowid"
    )
    .bind(kind.as_str())
    .fetch_all(db)
    .await?;

    Ok(items)
}

/// All lists keyed by wire name
pub async fn get_all_lists(db: &SqlitePool) -> Result<BTreeMap<String, Vec<String>>> {
    let mut lists = BTreeMap::new();
    for kind in ListKind::ALL {
        lists.insert(kind.as_str().to_string(), get_list(db, kind).await?);
    }
    Ok(lists)
}

/// Append an entry. Adding an entry already present is a no-op.
pub async fn add_item(db: &SqlitePool, kind: ListKind, item: &str) -> Result<Vec<String>> {
    let item = normalize_list_item(item)?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO list_items (list_name, item, position)
        VALUES (?, ?, (SELECT COALESCE(MAX(position), -1) + 1 FROM list_items WHERE list_name = ?))
        "#,
    )
    .bind(kind.as_str())
    .bind(&item)
    .bind(kind.as_str())
    .execute(db)
    .await?;

    get_list(db, kind).await
}

/// Remove an entry; removing an absent entry is a no-op
pub async fn remove_item(db: &SqlitePool, kind: ListKind, item: &str) -> Result<Vec<String>> {
    sqlx::query("DELETE FROM list_items WHERE list_name = ? AND item = ?")
        .bind(kind.as_str())
        .bind(item.trim())
        .execute(db)
        .await?;

    get_list(db, kind).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        dispatch_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_add_appends_trimmed() {
        let pool = setup_test_db().await;

        let items = add_item(&pool, ListKind::MineralTypes, "  M-Sand ").await.unwrap();
        assert_eq!(items, vec!["Rough Stone", "Gravel", "Savudu", "M-Sand"]);
    }

    #[tokio::test]
    async fn test_add_duplicate_is_noop() {
        let pool = setup_test_db().await;

        let items = add_item(&pool, ListKind::VehicleTypes, "Lorry").await.unwrap();
        assert_eq!(items, vec!["Tipper", "Lorry", "Tractor"]);
    }

    #[tokio::test]
    async fn test_add_empty_rejected() {
        let pool = setup_test_db().await;
        assert!(add_item(&pool, ListKind::LandTypes, "   ").await.is_err());
    }

    #[tokio::test]
    async fn test_remove_item() {
        let pool = setup_test_db().await;

        let items = remove_item(&pool, ListKind::LandTypes, "Patta Land").await.unwrap();
        assert_eq!(items, vec!["Porampoke Land", "Leased Land"]);

        let items = remove_item(&pool, ListKind::LandTypes, "Not There").await.unwrap();
        assert_eq!(items.len(), 2);
    }
}
