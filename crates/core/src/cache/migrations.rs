//! Schema versions for the preview cache database.
//!
//! `_migrations` records the highest applied version. Opening a database
//! applies every newer entry of [`MIGRATIONS`] in one pass, so an existing
//! cache file keeps its rows across upgrades.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Schema steps in ascending version order.
///
/// Version 1 creates `preview_cache`, keyed by the digest of the normalized
/// URL, with an index on `stored_at` for age-based purges.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_preview_cache.sql"))];

/// Bring the preview schema up to the latest version.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] naming the version whose SQL was rejected.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("preview schema v{version}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version, "applied preview schema version");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
