//! Profile settings database operations
//!
//! Key-value rows in the `settings` table; keys never written fall back to
//! the compiled profile defaults.

use dispatch_common::db::migrations::seed_default_lists;
use dispatch_common::profile::{is_profile_key, merged_profile};
use dispatch_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Stored profile values merged over defaults
pub async fn get_profile(db: &SqlitePool) -> Result<BTreeMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
        .fetch_all(db)
        .await?;

    let stored: BTreeMap<String, String> = rows.into_iter().collect();
    Ok(merged_profile(&stored))
}

/// Write several profile values at once; rejects the whole batch on an unknown key
pub async fn set_profile_values(db: &SqlitePool, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(unknown) = values.keys().find(|k| !is_profile_key(k)) {
        return Err(Error::InvalidInput(format!("Unknown profile setting: {}", unknown)));
    }

    let mut tx = db.begin().await?;
    for (key, value) in values {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value"
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}

/// Restore factory profile: clears stored values, drivers and pick lists,
/// then re-seeds the default lists. All or nothing.
pub async fn reset_profile(db: &SqlitePool) -> Result<()> {
    let mut tx = db.begin().await?;
    for sql in ["DELETE FROM settings", "DELETE FROM drivers", "DELETE FROM list_items"] {
        sqlx::query(sql).execute(&mut *tx).await?;
    }
    seed_default_lists(&mut tx).await?;
    tx.commit().await?;

    Ok(())
}
