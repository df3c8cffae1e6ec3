//! In-memory store for dry runs and tests.

use super::{record_key, BatchTx, Record, Store};
use crate::error::{IngestError, IngestResult};
use bazaar_core::EntityKind;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<EntityKind, Vec<Record>>>,
    fail_on: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `create` fails for any record with this natural key.
    pub fn failing_on(name: &str) -> Self {
        Self {
            tables: Mutex::default(),
            fail_on: Some(name.to_string()),
        }
    }

    /// Committed records of `kind`, in creation order.
    pub fn records(&self, kind: EntityKind) -> Vec<Record> {
        self.lock()
            .map(|t| t.get(&kind).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn lock(&self) -> IngestResult<MutexGuard<'_, HashMap<EntityKind, Vec<Record>>>> {
        self.tables
            .lock()
            .map_err(|_| IngestError::Store("memory store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn begin(&self, kind: EntityKind, key_field: &str) -> IngestResult<Box<dyn BatchTx + '_>> {
        let committed = self.lock()?.get(&kind).map(Vec::len).unwrap_or(0);
        Ok(Box::new(MemoryBatch {
            store: self,
            kind,
            key_field: key_field.to_string(),
            base_id: committed as i64,
            pending: Vec::new(),
        }))
    }

    fn count(&self, kind: EntityKind) -> IngestResult<u64> {
        Ok(self.lock()?.get(&kind).map(Vec::len).unwrap_or(0) as u64)
    }
}

struct MemoryBatch<'a> {
    store: &'a MemoryStore,
    kind: EntityKind,
    key_field: String,
    base_id: i64,
    pending: Vec<Record>,
}

impl BatchTx for MemoryBatch<'_> {
    fn exists(&mut self, key: &str) -> IngestResult<bool> {
        let same = |r: &Record| record_key(r, &self.key_field) == Some(key);
        if self.pending.iter().any(same) {
            return Ok(true);
        }
        let tables = self.store.lock()?;
        Ok(tables
            .get(&self.kind)
            .is_some_and(|rows| rows.iter().any(same)))
    }

    fn create(&mut self, record: &Record) -> IngestResult<i64> {
        let key = record_key(record, &self.key_field);
        if key.is_some() && key == self.store.fail_on.as_deref() {
            return Err(IngestError::Store(format!(
                "refusing to store {}",
                key.unwrap_or_default()
            )));
        }
        self.pending.push(record.clone());
        Ok(self.base_id + self.pending.len() as i64)
    }

    fn commit(self: Box<Self>) -> IngestResult<()> {
        let mut tables = self.store.lock()?;
        tables.entry(self.kind).or_default().extend(self.pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str) -> Record {
        json!({ "name": name }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_uncommitted_batch_is_discarded() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin(EntityKind::Hero, "name").unwrap();
            tx.create(&record("Dooley")).unwrap();
            assert!(tx.exists("Dooley").unwrap());
        }
        assert_eq!(store.count(EntityKind::Hero).unwrap(), 0);
    }

    #[test]
    fn test_commit_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let mut tx = store.begin(EntityKind::Hero, "name").unwrap();
        assert_eq!(tx.create(&record("Dooley")).unwrap(), 1);
        assert_eq!(tx.create(&record("Pygmalien")).unwrap(), 2);
        tx.commit().unwrap();

        let mut tx = store.begin(EntityKind::Hero, "name").unwrap();
        assert!(tx.exists("Pygmalien").unwrap());
        assert_eq!(tx.create(&record("Vanessa")).unwrap(), 3);
    }

    #[test]
    fn test_failing_on_name() {
        let store = MemoryStore::failing_on("Cursed");
        let mut tx = store.begin(EntityKind::Item, "name").unwrap();
        assert!(tx.create(&record("Fine")).is_ok());
        assert!(tx.create(&record("Cursed")).is_err());
    }
}
