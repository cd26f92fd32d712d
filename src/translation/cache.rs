/*!
 * Translation caching functionality.
 *
 * Translations are persisted in a SQLite database keyed by the SHA-256 of the
 * source text, so repeated requests for the same text never reach a backend.
 * Every operation runs on tokio's blocking pool.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Database filename inside the cache directory
pub const CACHE_DB_FILENAME: &str = "translations.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS translation_cache (
        source_hash TEXT PRIMARY KEY,
        source_text TEXT NOT NULL,
        translated_text TEXT NOT NULL,
        created_at TEXT NOT NULL,
        hit_count INTEGER NOT NULL DEFAULT 0
    );
"#;

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached translations
    pub total_entries: i64,
    /// Number of cache hits across all entries
    pub total_hits: i64,
}

/// Persistent translation cache
#[derive(Clone)]
pub struct TranslationCache {
    /// Path to the database file, `:memory:` for in-memory caches
    db_path: PathBuf,
    /// Thread-safe connection
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl TranslationCache {
    /// Open (or create) the cache inside `cache_dir`
    pub fn open<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", cache_dir))?;

        let db_path = cache_dir.join(CACHE_DB_FILENAME);
        info!("Opening translation cache at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open cache database: {:?}", db_path))?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize cache schema")?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory cache (for testing)
    pub fn in_memory() -> Result<Self> {
        debug!("Creating in-memory translation cache");

        let conn = Connection::open_in_memory().context("Failed to create in-memory cache")?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize cache schema")?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Cache key for a source text
    pub fn cache_key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Run an operation against the connection on the blocking pool
    async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await
        .context("Cache task panicked")?
    }

    /// Get a cached translation
    pub async fn get(&self, source_text: &str) -> Result<Option<String>> {
        let key = Self::cache_key(source_text);

        self.execute_async(move |conn| {
            let cached: Option<String> = conn
                .query_row(
                    "SELECT translated_text FROM translation_cache WHERE source_hash = ?1",
                    [&key],
                    |row| row.get(0),
                )
                .optional()?;

            if cached.is_some() {
                conn.execute(
                    "UPDATE translation_cache SET hit_count = hit_count + 1 WHERE source_hash = ?1",
                    [&key],
                )?;
                debug!("Cache hit for {}", &key[..12]);
            } else {
                debug!("Cache miss for {}", &key[..12]);
            }

            Ok(cached)
        })
        .await
    }

    /// Store a translation, replacing any previous one for the same text
    pub async fn set(&self, source_text: &str, translation: &str) -> Result<()> {
        let key = Self::cache_key(source_text);
        let source_text = source_text.to_string();
        let translation = translation.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.execute_async(move |conn| {
            conn.execute(
                r#"
                INSERT INTO translation_cache (source_hash, source_text, translated_text, created_at, hit_count)
                VALUES (?1, ?2, ?3, ?4, 0)
                ON CONFLICT(source_hash) DO UPDATE SET
                    source_text = excluded.source_text,
                    translated_text = excluded.translated_text,
                    created_at = excluded.created_at
                "#,
                params![key, source_text, translation, created_at],
            )?;
            debug!("Cached translation for {}", &key[..12]);
            Ok(())
        })
        .await
    }

    /// Remove every cached translation, returning how many were removed
    pub async fn clear(&self) -> Result<usize> {
        self.execute_async(|conn| {
            let deleted = conn.execute("DELETE FROM translation_cache", [])?;
            debug!("Translation cache cleared ({} entries)", deleted);
            Ok(deleted)
        })
        .await
    }

    /// Number of cached translations
    pub async fn len(&self) -> Result<usize> {
        self.execute_async(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    /// Whether the cache holds no translations
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        self.execute_async(|conn| {
            let total_entries: i64 =
                conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))?;
            let total_hits: i64 = conn.query_row(
                "SELECT COALESCE(SUM(hit_count), 0) FROM translation_cache",
                [],
                |row| row.get(0),
            )?;

            Ok(CacheStats {
                total_entries,
                total_hits,
            })
        })
        .await
    }
}
