use crate::{
    domain::LocalStore,
    errors::{AppError, LocalStoreError},
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use std::{path::Path, sync::Arc};

pub type StorePool = Pool<SqliteConnectionManager>;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_client_entries",
    include_str!("../migrations/001_client_entries.sql"),
)];

/// Per-client key/value store on SQLite, one row per `(client_id, key)`.
///
/// Each get or set takes its own pooled connection, so read-modify-write
/// sequences from concurrent requests can interleave.
#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: StorePool,
}

impl SqliteLocalStore {
    /// A private in-memory database. The pool holds a single connection since
    /// every SQLite memory connection is its own database.
    pub fn in_memory() -> Result<Self, LocalStoreError> {
        let pool = Pool::builder().max_size(1).build(SqliteConnectionManager::memory())?;
        Self::with_pool(pool)
    }

    /// Opens or creates the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LocalStoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA synchronous = NORMAL;"));
        let pool = Pool::builder().max_size(8).build(manager)?;
        pool.get()?.execute_batch("PRAGMA journal_mode = WAL;")?;

        tracing::info!(path = %path.display(), "Opened local store");
        Self::with_pool(pool)
    }

    fn with_pool(pool: StorePool) -> Result<Self, LocalStoreError> {
        run_migrations(&pool)?;
        Ok(Self { pool })
    }
}

fn run_migrations(pool: &StorePool) -> Result<(), LocalStoreError> {
    let conn = pool.get()?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        if !already_applied {
            tracing::info!("Applying local store migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute("INSERT INTO schema_version (name) VALUES (?1)", params![name])?;
        }
    }
    Ok(())
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, client_id: &str, key: &str) -> Result<Option<Value>, LocalStoreError> {
        let conn = self.pool.get()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM client_entries WHERE client_id = ?1 AND key = ?2",
                params![client_id, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(raw.map(|raw| serde_json::from_str(&raw)).transpose()?)
    }

    fn set(&self, client_id: &str, key: &str, value: Value) -> Result<(), LocalStoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO client_entries (client_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (client_id, key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![client_id, key, value.to_string()],
        )?;
        tracing::debug!(client_id, key, "Local store write");
        Ok(())
    }
}

/// Runs store work on tokio's blocking pool so SQLite I/O stays off the async workers.
pub async fn run_blocking<T, F>(store: &Arc<dyn LocalStore>, work: F) -> Result<T, AppError>
where
    F: FnOnce(&dyn LocalStore) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || work(store.as_ref()))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Local store task failed: {}", e)))?
}
