//! Database initialization
//!
//! Creates the database file on first run, applies pragmas, creates tables
//! (idempotent) and runs versioned migrations.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets history listing proceed while a bulk insert is committing
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and run migrations on an already-open pool.
///
/// Used directly by tests against `sqlite::memory:` pools.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_scans_table(pool).await?;
    create_drivers_table(pool).await?;
    create_list_items_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Lessee/document profile values; list and driver data live in their own tables
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_scans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scans (
            guid TEXT PRIMARY KEY,
            permit_no TEXT NOT NULL DEFAULT '',
            lessee_id TEXT NOT NULL DEFAULT '',
            dispatch_slip_no TEXT NOT NULL DEFAULT '',
            mine_code TEXT NOT NULL DEFAULT '',
            dispatch_date TEXT NOT NULL DEFAULT '',
            parsed_date TIMESTAMP NOT NULL,
            distance TEXT NOT NULL DEFAULT '',
            duration TEXT NOT NULL DEFAULT '',
            mineral_qty TEXT NOT NULL DEFAULT '',
            vehicle_no TEXT NOT NULL DEFAULT '',
            district TEXT NOT NULL DEFAULT '',
            raw TEXT NOT NULL DEFAULT '',
            format TEXT NOT NULL DEFAULT 'legacy' CHECK (format IN ('legacy', 'extended')),
            vehicle_type TEXT NOT NULL DEFAULT '',
            driver_name TEXT NOT NULL DEFAULT '',
            driver_license TEXT NOT NULL DEFAULT '',
            driver_phone TEXT NOT NULL DEFAULT '',
            destination TEXT NOT NULL DEFAULT '',
            delivered_to TEXT NOT NULL DEFAULT '',
            order_ref TEXT NOT NULL DEFAULT '',
            trip_sheet_status TEXT NOT NULL DEFAULT 'generated'
                CHECK (trip_sheet_status IN ('generated', 'printed', 'given')),
            is_deleted INTEGER NOT NULL DEFAULT 0,
            deleted_at TIMESTAMP,
            scanned_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_drivers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drivers (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            license TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            vehicle_no TEXT NOT NULL DEFAULT '',
            vehicle_type TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Pick-list entries; `position` preserves insertion order
pub async fn create_list_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS list_items (
            list_name TEXT NOT NULL,
            item TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (list_name, item)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
