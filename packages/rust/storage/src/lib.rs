//! libSQL-backed document cache.
//!
//! The [`DocumentCache`] is an opaque string-to-string store with TTL
//! expiry: rendered Markdown keyed by a (url, options) fingerprint. An
//! expired entry behaves as a miss and is deleted lazily on read. Writes
//! are last-write-wins; cached values are pure functions of their key, so
//! concurrent writers need no coordination.

mod migrations;

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use tracing::debug;

use pagemark_shared::{PagemarkError, Result};

/// Cache handle wrapping a libSQL database.
pub struct DocumentCache {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl DocumentCache {
    /// Open or create a cache database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PagemarkError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;

        let cache = Self { db, conn };
        cache.run_migrations().await?;
        Ok(cache)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    PagemarkError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Look up a cached value. An entry past its expiry behaves as a miss.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT value, expires_at FROM document_cache WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(PagemarkError::Storage(e.to_string())),
        };

        let value: String = row
            .get(0)
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;
        let expires_at: Option<String> = row.get::<String>(1).ok();

        if let Some(expires_at) = expires_at {
            let expired = chrono::DateTime::parse_from_rfc3339(&expires_at)
                .map(|dt| dt.with_timezone(&Utc) <= Utc::now())
                .unwrap_or(true);

            if expired {
                debug!(key, "cache entry expired, deleting");
                self.delete(key).await?;
                return Ok(None);
            }
        }

        Ok(Some(value))
    }

    /// Store a value. `ttl_secs = None` means the entry never expires.
    ///
    /// An existing entry under the same key is overwritten.
    pub async fn put(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<()> {
        let now = Utc::now();
        let expires_at =
            ttl_secs.map(|ttl| (now + chrono::Duration::seconds(ttl as i64)).to_rfc3339());

        self.conn
            .execute(
                "INSERT INTO document_cache (key, value, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   created_at = excluded.created_at,
                   expires_at = excluded.expires_at",
                params![key, value, now.to_rfc3339().as_str(), expires_at.as_deref()],
            )
            .await
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Remove an entry.
    async fn delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM document_cache WHERE key = ?1", params![key])
            .await
            .map_err(|e| PagemarkError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_cache(name: &str) -> (DocumentCache, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!(
            "pagemark-cache-test-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        let cache = DocumentCache::open(&dir.join("cache.db")).await.unwrap();
        (cache, dir)
    }

    #[tokio::test]
    async fn get_miss_on_unknown_key() {
        let (cache, dir) = temp_cache("miss").await;
        assert_eq!(cache.get("nope").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let (cache, dir) = temp_cache("roundtrip").await;
        cache.put("k", "# Markdown", Some(1800)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("# Markdown"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn overwrite_is_last_write_wins() {
        let (cache, dir) = temp_cache("overwrite").await;
        cache.put("k", "first", Some(1800)).await.unwrap();
        cache.put("k", "second", Some(1800)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let (cache, dir) = temp_cache("expired").await;
        // Zero TTL: expires_at == now, so the entry is already stale.
        cache.put("k", "stale", Some(0)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        // The lazy delete removed the row entirely.
        assert_eq!(cache.get("k").await.unwrap(), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn permanent_entry_never_expires() {
        let (cache, dir) = temp_cache("permanent").await;
        cache.put("tweet-123", "Tweet from @a", None).await.unwrap();
        assert_eq!(
            cache.get("tweet-123").await.unwrap().as_deref(),
            Some("Tweet from @a")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn distinct_keys_are_independent() {
        let (cache, dir) = temp_cache("distinct").await;
        cache.put("url", "plain", Some(1800)).await.unwrap();
        cache.put("url-detailed", "full", Some(1800)).await.unwrap();
        assert_eq!(cache.get("url").await.unwrap().as_deref(), Some("plain"));
        assert_eq!(
            cache.get("url-detailed").await.unwrap().as_deref(),
            Some("full")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
