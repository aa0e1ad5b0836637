//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary, so
//! a fresh machine only needs the `faktix` executable.
//!
//! | File                     | Creates                                   |
//! |--------------------------|-------------------------------------------|
//! | `001_initial_schema.sql` | `invoices`, `profiles`, `calculations`    |
//!
//! Applied files are recorded in `_sqlx_migrations` with a checksum; editing
//! one after release makes startup fail, so schema changes go in a new
//! `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded. Safe to call on each start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!(known = MIGRATOR.migrations.len(), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts. Before the first run the
/// bookkeeping table does not exist and `applied` is 0.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let bookkept: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if bookkept {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    } else {
        0
    };

    Ok((MIGRATOR.migrations.len(), applied as usize))
}
