//! Database schema migrations
//!
//! Versioned, idempotent steps run after the `CREATE TABLE IF NOT EXISTS`
//! pass. Each applied version is recorded in `schema_version`.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field have already applied them
//! 2. **Always add new migrations** - one function per schema change
//! 3. **Use ALTER TABLE** - prefer it over DROP/CREATE to preserve data

use crate::profile::ListKind;
use crate::Result;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database (0 when nothing applied yet)
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> = sqlx::query_scalar(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1"
    )
    .fetch_optional(pool)
    .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: indexes backing history listing and recycle-bin queries
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    for sql in [
        "CREATE INDEX IF NOT EXISTS idx_scans_scanned_at ON scans (is_deleted, scanned_at)",
        "CREATE INDEX IF NOT EXISTS idx_scans_parsed_date ON scans (is_deleted, parsed_date)",
        "CREATE INDEX IF NOT EXISTS idx_scans_deleted_at ON scans (deleted_at) WHERE is_deleted = 1",
        "CREATE INDEX IF NOT EXISTS idx_scans_permit_no ON scans (permit_no)",
    ] {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

/// Migration v2: seed the default pick lists
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    seed_default_lists(&mut tx).await?;
    tx.commit().await?;

    Ok(())
}

/// Insert each list's default entries, leaving existing entries alone.
/// Takes a connection so callers can seed inside their own transaction.
pub async fn seed_default_lists(conn: &mut SqliteConnection) -> Result<()> {
    for kind in ListKind::ALL {
        for (position, item) in kind.defaults().iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO list_items (list_name, item, position) VALUES (?, ?, ?)"
            )
            .bind(kind.as_str())
            .bind(*item)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}
