//! Preview entry CRUD operations.
//!
//! Entries are opaque byte payloads addressed by the SHA-256 of their
//! canonical key. The clear-text key is kept alongside for domain purges.

use url::Url;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Whether the URL in `key` is served from `domain` or a subdomain of it.
///
/// `domain` is expected lowercase without a leading `www.`.
fn key_on_domain(key: &str, domain: &str) -> bool {
    let Ok(url) = Url::parse(key) else { return false };
    let Some(host) = url.host_str() else { return false };
    let host = host.to_ascii_lowercase();
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

/// Fixed-width timestamps so `stored_at` compares correctly as text.
fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

impl CacheDb {
    /// Insert or replace the payload stored under `key`.
    pub async fn put_entry(&self, key: &str, value: &[u8]) -> Result<(), Error> {
        let key = key.to_string();
        let key_hash = compute_cache_key(&key);
        let value = value.to_vec();
        let stored_at = timestamp(chrono::Utc::now());
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO preview_cache (key_hash, key, value, stored_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key_hash) DO UPDATE SET
                        key = excluded.key,
                        value = excluded.value,
                        stored_at = excluded.stored_at",
                    params![key_hash, key, value, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the payload stored under `key`.
    ///
    /// Returns None if the key doesn't exist in the cache.
    pub async fn get_entry(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let key_hash = compute_cache_key(key);
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM preview_cache WHERE key_hash = ?1")?;

                match stmt.query_row(params![key_hash], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM preview_cache", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries stored more than `max_age` ago.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_older_than(&self, max_age: chrono::Duration) -> Result<u64, Error> {
        let cutoff = timestamp(chrono::Utc::now() - max_age);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM preview_cache WHERE stored_at < ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries whose key is on `domain` or one of its subdomains.
    ///
    /// Matching is on the parsed host, so `example.com` covers
    /// `www.example.com` and `blog.example.com` but not `notexample.com`.
    /// Returns the number of deleted entries.
    pub async fn purge_by_domain(&self, domain: &str) -> Result<u64, Error> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_string();
        if domain.is_empty() {
            return Ok(0);
        }

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let doomed: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT key_hash, key FROM preview_cache")?;
                    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
                    let mut doomed = Vec::new();
                    for row in rows {
                        let (key_hash, key) = row?;
                        if key_on_domain(&key, &domain) {
                            doomed.push(key_hash);
                        }
                    }
                    doomed
                };

                let mut deleted = 0u64;
                for key_hash in &doomed {
                    deleted += tx.execute("DELETE FROM preview_cache WHERE key_hash = ?1", params![key_hash])? as u64;
                }
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM preview_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
