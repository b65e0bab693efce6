//! Repository Pattern for the item state store
//!
//! The reconciler only talks to the [`ItemRepository`] trait, so the
//! durable SQLite store and the in-memory mock are interchangeable:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Reconciler                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ItemRepository                          │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                            │
//!                 ▼                            ▼
//!       ┌─────────────────┐          ┌─────────────────┐
//!       │     SQLite      │          │      Mock       │
//!       │  Implementation │          │ Implementation  │
//!       └─────────────────┘          └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use modwatch::storage::repository::{ItemRepository, SqliteItemRepository};
//!
//! let repo = SqliteItemRepository::new("mod_updates.db")?;
//! repo.upsert("2579252958", 1_700_000_000, "Community Framework", 1_700_000_500)?;
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::ItemRecord;

// ============================================================================
// Repository Trait
// ============================================================================

/// Keyed store of last-known item versions
///
/// Every operation touches a single record and is atomic on its own.
pub trait ItemRepository: Send + Sync {
    /// Get the record for an id
    fn get(&self, id: &str) -> Result<Option<ItemRecord>>;

    /// Create the record, or overwrite every field of an existing one
    fn upsert(&self, id: &str, last_updated: i64, display_name: &str, last_checked: i64)
        -> Result<()>;

    /// Advance only `last_checked`; never moves it backwards.
    /// Missing ids are ignored.
    fn touch_checked(&self, id: &str, last_checked: i64) -> Result<()>;

    /// Number of stored records
    fn count(&self) -> Result<usize>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of ItemRepository
///
/// The connection sits behind a `Mutex` so the repository is `Sync`;
/// the monitor itself only ever uses it from one task.
pub struct SqliteItemRepository {
    conn: Mutex<Connection>,
}

impl SqliteItemRepository {
    /// Open (or create) the store at `path`
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable` if the path is empty, the file cannot
    /// be opened, is not a SQLite database, fails `PRAGMA quick_check`, or the schema cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        if path_str.trim().is_empty() {
            return Err(Error::store_unavailable("", "empty database path"));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::store_unavailable(&path_str, e.to_string()))?;
            }
        }

        let conn =
            Connection::open(path).map_err(|e| Error::store_unavailable(&path_str, e.to_string()))?;

        // Enable WAL mode for crash safety
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::store_unavailable(&path_str, e.to_string()))?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.verify_integrity()
            .and_then(|()| repo.create_schema())
            .map_err(|e| Error::store_unavailable(&path_str, e.to_string()))?;

        tracing::info!(path = %path_str, "SQLite state store initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::store_unavailable(":memory:", e.to_string()))?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("SQLite connection mutex poisoned"))
    }

    /// Reject files that are not databases or are damaged
    fn verify_integrity(&self) -> Result<()> {
        let conn = self.lock()?;
        let status: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
        if status != "ok" {
            return Err(Error::internal(format!("quick_check reported: {status}")));
        }
        Ok(())
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS mod_updates (
                    mod_id TEXT PRIMARY KEY,
                    last_updated INTEGER NOT NULL,
                    mod_name TEXT NOT NULL,
                    last_checked INTEGER NOT NULL
                );
                "#,
        )?;

        Ok(())
    }
}

impl ItemRepository for SqliteItemRepository {
    fn get(&self, id: &str) -> Result<Option<ItemRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT mod_id, last_updated, mod_name, last_checked
                 FROM mod_updates WHERE mod_id = ?1",
                params![id],
                |row| {
                    Ok(ItemRecord {
                        id: row.get(0)?,
                        last_updated: row.get(1)?,
                        display_name: row.get(2)?,
                        last_checked: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    fn upsert(
        &self,
        id: &str,
        last_updated: i64,
        display_name: &str,
        last_checked: i64,
    ) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
                INSERT INTO mod_updates (mod_id, last_updated, mod_name, last_checked)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(mod_id) DO UPDATE SET
                    last_updated = excluded.last_updated,
                    mod_name = excluded.mod_name,
                    last_checked = excluded.last_checked
                "#,
            params![id, last_updated, display_name, last_checked],
        )?;

        Ok(())
    }

    fn touch_checked(&self, id: &str, last_checked: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE mod_updates SET last_checked = MAX(last_checked, ?2) WHERE mod_id = ?1",
            params![id, last_checked],
        )?;

        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM mod_updates", [], |row| row.get(0))?;
        Ok(total as usize)
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of ItemRepository
#[derive(Default)]
pub struct MockItemRepository {
    records: RwLock<HashMap<String, ItemRecord>>,
}

impl MockItemRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly
    pub fn insert(&self, record: ItemRecord) {
        if let Ok(mut records) = self.records.write() {
            records.insert(record.id.clone(), record);
        }
    }

    /// Check if repository is empty
    pub fn is_empty(&self) -> bool {
        self.records.read().map(|r| r.is_empty()).unwrap_or(true)
    }

    fn poisoned() -> Error {
        Error::internal("mock repository lock poisoned")
    }
}

impl ItemRepository for MockItemRepository {
    fn get(&self, id: &str) -> Result<Option<ItemRecord>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(id).cloned())
    }

    fn upsert(
        &self,
        id: &str,
        last_updated: i64,
        display_name: &str,
        last_checked: i64,
    ) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.insert(
            id.to_string(),
            ItemRecord {
                id: id.to_string(),
                last_updated,
                display_name: display_name.to_string(),
                last_checked,
            },
        );
        Ok(())
    }

    fn touch_checked(&self, id: &str, last_checked: i64) -> Result<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if let Some(record) = records.get_mut(id) {
            record.last_checked = record.last_checked.max(last_checked);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.len())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedItemRepository = Arc<dyn ItemRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedItemRepository> {
    let repo = SqliteItemRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedItemRepository {
    Arc::new(MockItemRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
