//! Persistence collaborator.
//!
//! The importer sees only this contract: open a batch for one entity type and
//! its natural-key field, ask whether a key exists, create records, commit.
//! Dropping a batch without committing discards everything it created.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::IngestResult;
use bazaar_core::EntityKind;
use serde_json::{Map, Value};

/// A record as it crosses the store boundary.
pub type Record = Map<String, Value>;

pub trait Store: Send + Sync {
    /// Start a batch for `kind`, keyed by `key_field`.
    fn begin(&self, kind: EntityKind, key_field: &str) -> IngestResult<Box<dyn BatchTx + '_>>;

    /// Persisted rows of `kind`.
    fn count(&self, kind: EntityKind) -> IngestResult<u64>;
}

/// One open batch. Rolls back on drop unless committed.
pub trait BatchTx {
    /// Whether a row with this natural key is visible, including rows created
    /// earlier in this batch.
    fn exists(&mut self, key: &str) -> IngestResult<bool>;

    /// Persist a record, returning the store-assigned identity.
    fn create(&mut self, record: &Record) -> IngestResult<i64>;

    fn commit(self: Box<Self>) -> IngestResult<()>;
}

/// Natural-key value of a record, if it is a string.
pub fn record_key<'a>(record: &'a Record, key_field: &str) -> Option<&'a str> {
    record.get(key_field).and_then(Value::as_str)
}
