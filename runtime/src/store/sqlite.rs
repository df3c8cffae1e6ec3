//! SQLite-backed store.
//!
//! One table per entity type with a unique `name`. Record keys that are not
//! columns are ignored; arrays and objects are stored as JSON text.

use super::{BatchTx, Record, Store};
use crate::error::{IngestError, IngestResult};
use bazaar_core::EntityKind;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS heroes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    slug TEXT,
    description TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_heroes_name ON heroes(name);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    size TEXT NOT NULL DEFAULT 'medium',
    source TEXT NOT NULL DEFAULT 'universal',
    hero_id INTEGER,
    monster_id INTEGER,
    cooldown REAL,
    effect TEXT,
    cost INTEGER,
    types TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_items_name ON items(name);

CREATE TABLE IF NOT EXISTS skills (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    source TEXT NOT NULL DEFAULT 'universal',
    hero_id INTEGER,
    monster_id INTEGER,
    tier TEXT,
    effect TEXT,
    types TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_skills_name ON skills(name);

CREATE TABLE IF NOT EXISTS monsters (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    appears_on_day INTEGER
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_monsters_name ON monsters(name);

CREATE TABLE IF NOT EXISTS merchants (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    merchant_type TEXT NOT NULL DEFAULT 'regular',
    appears_on_day INTEGER
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_merchants_name ON merchants(name);
";

/// Writable columns of each table, excluding `id`.
fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Hero => &["name", "slug", "description"],
        EntityKind::Item => &[
            "name",
            "description",
            "size",
            "source",
            "hero_id",
            "monster_id",
            "cooldown",
            "effect",
            "cost",
            "types",
        ],
        EntityKind::Skill => &[
            "name",
            "description",
            "source",
            "hero_id",
            "monster_id",
            "tier",
            "effect",
            "types",
        ],
        EntityKind::Monster => &["name", "description", "appears_on_day"],
        EntityKind::Merchant => &["name", "description", "merchant_type", "appears_on_day"],
    }
}

/// Convert a JSON value to the SQLite value stored for it.
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database file.
    pub fn open(path: &Path) -> IngestResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| IngestError::Store(format!("failed to open {}: {e}", path.display())))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> IngestResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> IngestResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| IngestError::Store(format!("failed to create schema: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> IngestResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| IngestError::Store("connection lock poisoned".to_string()))
    }

    /// Identity of the row with this name, if any.
    pub fn id_of(&self, kind: EntityKind, name: &str) -> IngestResult<Option<i64>> {
        let conn = self.lock()?;
        let sql = format!("SELECT id FROM {} WHERE name = ?1", kind.plural());
        Ok(conn
            .query_row(&sql, params![name], |row| row.get(0))
            .optional()?)
    }
}

impl Store for SqliteStore {
    fn begin(&self, kind: EntityKind, key_field: &str) -> IngestResult<Box<dyn BatchTx + '_>> {
        if !columns(kind).contains(&key_field) {
            return Err(IngestError::import(
                kind,
                format!("{key_field} is not a column of {}", kind.plural()),
            ));
        }
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteBatch {
            conn,
            kind,
            key_field: key_field.to_string(),
            finished: false,
        }))
    }

    fn count(&self, kind: EntityKind) -> IngestResult<u64> {
        let conn = self.lock()?;
        let sql = format!("SELECT COUNT(*) FROM {}", kind.plural());
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

struct SqliteBatch<'a> {
    conn: MutexGuard<'a, Connection>,
    kind: EntityKind,
    key_field: String,
    finished: bool,
}

impl BatchTx for SqliteBatch<'_> {
    fn exists(&mut self, key: &str) -> IngestResult<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1",
            self.kind.plural(),
            self.key_field
        );
        let found: Option<i64> = self
            .conn
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn create(&mut self, record: &Record) -> IngestResult<i64> {
        let (names, values): (Vec<&str>, Vec<SqlValue>) = columns(self.kind)
            .iter()
            .filter_map(|col| record.get(*col).map(|v| (*col, to_sql_value(v))))
            .unzip();
        if names.is_empty() {
            return Err(IngestError::import(self.kind, "record has no known fields"));
        }
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.kind.plural(),
            names.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn commit(mut self: Box<Self>) -> IngestResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteBatch<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                debug!(entity = %self.kind, error = %e, "rollback failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_and_exists() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut tx = store.begin(EntityKind::Item, "name").unwrap();
        let id = tx
            .create(&record(json!({
                "name": "Hammer",
                "size": "small",
                "cooldown": 4.5,
                "cost": null,
                "flavor": "ignored"
            })))
            .unwrap();
        assert_eq!(id, 1);
        assert!(tx.exists("Hammer").unwrap());
        assert!(!tx.exists("Anvil").unwrap());
        tx.commit().unwrap();

        assert_eq!(store.count(EntityKind::Item).unwrap(), 1);
        assert_eq!(store.id_of(EntityKind::Item, "Hammer").unwrap(), Some(1));
    }

    #[test]
    fn test_drop_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        {
            let mut tx = store.begin(EntityKind::Hero, "name").unwrap();
            tx.create(&record(json!({"name": "Dooley"}))).unwrap();
        }
        assert_eq!(store.count(EntityKind::Hero).unwrap(), 0);

        // The connection is usable again after the rollback.
        let mut tx = store.begin(EntityKind::Hero, "name").unwrap();
        tx.create(&record(json!({"name": "Dooley"}))).unwrap();
        tx.commit().unwrap();
        assert_eq!(store.count(EntityKind::Hero).unwrap(), 1);
    }

    #[test]
    fn test_unique_name_enforced() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut tx = store.begin(EntityKind::Monster, "name").unwrap();
        tx.create(&record(json!({"name": "Boarrior"}))).unwrap();
        assert!(tx.create(&record(json!({"name": "Boarrior"}))).is_err());
    }

    #[test]
    fn test_rejects_unknown_key_field() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.begin(EntityKind::Hero, "name; DROP TABLE heroes").is_err());
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("bazaar.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            let mut tx = store.begin(EntityKind::Merchant, "name").unwrap();
            tx.create(&record(json!({"name": "Chris", "merchant_type": "regular"})))
                .unwrap();
            tx.commit().unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count(EntityKind::Merchant).unwrap(), 1);
    }

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value(&json!(3)), SqlValue::Integer(3));
        assert_eq!(to_sql_value(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Integer(1));
        assert_eq!(to_sql_value(&json!(["a"])), SqlValue::Text("[\"a\"]".into()));
    }
}
