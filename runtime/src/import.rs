//! Idempotent create-if-absent import.
//!
//! Each entity-type batch runs in one store transaction. A record whose
//! natural key already exists is skipped, never updated, so re-running any
//! batch is safe. A failure anywhere in a batch rolls back that batch only.

use crate::checkpoint::ArtifactStore;
use crate::error::{IngestError, IngestResult};
use crate::store::{record_key, Record, Store};
use bazaar_core::{
    Entity, EntityBatch, EntityKind, FallbackCounter, HeroRecord, ItemRecord, MerchantRecord,
    MonsterRecord, SkillRecord,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of importing one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records newly persisted. Zero when the batch rolled back.
    pub created: usize,
    /// Records whose natural key was already present.
    pub skipped: usize,
    pub rolled_back: bool,
}

impl ImportSummary {
    fn rolled_back() -> Self {
        Self {
            created: 0,
            skipped: 0,
            rolled_back: true,
        }
    }
}

#[derive(Clone)]
pub struct Importer {
    store: Arc<dyn Store>,
}

impl Importer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Import typed records of one entity type.
    pub fn import_batch<T: Entity>(&self, records: &[T]) -> ImportSummary {
        let rows: Result<Vec<Record>, _> = records.iter().map(to_record).collect();
        match rows {
            Ok(rows) => self.import_records(T::KIND, T::KEY_FIELD, &rows),
            Err(e) => {
                error!(entity = %T::KIND, error = %e, "batch could not be serialized");
                ImportSummary::rolled_back()
            }
        }
    }

    /// Import whichever entity type `batch` holds.
    pub fn import_entity_batch(&self, batch: &EntityBatch) -> ImportSummary {
        match batch {
            EntityBatch::Heroes(v) => self.import_batch(v),
            EntityBatch::Items(v) => self.import_batch(v),
            EntityBatch::Skills(v) => self.import_batch(v),
            EntityBatch::Monsters(v) => self.import_batch(v),
            EntityBatch::Merchants(v) => self.import_batch(v),
        }
    }

    /// Import records keyed by `key_field`. Never fails: errors roll back
    /// the batch and report zero created.
    pub fn import_records(
        &self,
        kind: EntityKind,
        key_field: &str,
        records: &[Record],
    ) -> ImportSummary {
        match self.try_import(kind, key_field, records) {
            Ok(summary) => {
                info!(
                    entity = %kind,
                    created = summary.created,
                    skipped = summary.skipped,
                    "batch imported"
                );
                summary
            }
            Err(e) => {
                error!(entity = %kind, error = %e, "batch rolled back");
                ImportSummary::rolled_back()
            }
        }
    }

    fn try_import(
        &self,
        kind: EntityKind,
        key_field: &str,
        records: &[Record],
    ) -> IngestResult<ImportSummary> {
        let mut tx = self.store.begin(kind, key_field)?;
        let mut summary = ImportSummary::default();
        for record in records {
            let key = record_key(record, key_field)
                .ok_or_else(|| IngestError::import(kind, format!("record has no {key_field}")))?;
            if tx.exists(key)? {
                debug!(entity = %kind, name = key, "already present, skipped");
                summary.skipped += 1;
                continue;
            }
            tx.create(record)?;
            summary.created += 1;
        }
        tx.commit()?;
        Ok(summary)
    }

    /// Import the checkpoint artifact for `kind`.
    ///
    /// Category values the artifact holds outside the known set are counted
    /// into `fallbacks` before being defaulted. A missing or unreadable
    /// artifact imports nothing.
    pub fn import_artifact(
        &self,
        artifacts: &ArtifactStore,
        kind: EntityKind,
        fallbacks: &mut FallbackCounter,
    ) -> ImportSummary {
        let values = match artifacts.read(kind) {
            Ok(Some(values)) => values,
            Ok(None) => {
                info!(entity = %kind, "no artifact to import");
                return ImportSummary::default();
            }
            Err(e) => {
                warn!(entity = %kind, error = %e, "artifact unreadable");
                return ImportSummary::default();
            }
        };

        match kind {
            EntityKind::Hero => self.import_batch(&load::<HeroRecord>(values, fallbacks)),
            EntityKind::Item => self.import_batch(&load::<ItemRecord>(values, fallbacks)),
            EntityKind::Skill => self.import_batch(&load::<SkillRecord>(values, fallbacks)),
            EntityKind::Monster => self.import_batch(&load::<MonsterRecord>(values, fallbacks)),
            EntityKind::Merchant => self.import_batch(&load::<MerchantRecord>(values, fallbacks)),
        }
    }
}

fn to_record<T: Serialize>(record: &T) -> Result<Record, serde_json::Error> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Ok(Record::from_iter([("value".to_string(), other)])),
    }
}

/// Convert raw artifact values into `T`, counting category fallbacks.
/// Values that are not records of `T` at all are skipped.
fn load<T: Entity>(values: Vec<Value>, fallbacks: &mut FallbackCounter) -> Vec<T> {
    let mut records = Vec::with_capacity(values.len());
    for value in values {
        let defaulted: Vec<&'static str> = T::CATEGORY_FIELDS
            .iter()
            .filter(|field| {
                !value
                    .get(field.key)
                    .and_then(Value::as_str)
                    .is_some_and(|label| (field.recognizes)(label))
            })
            .map(|field| field.counter)
            .collect();
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                for counter in defaulted {
                    fallbacks.record(counter);
                }
                records.push(record);
            }
            Err(e) => warn!(entity = %T::KIND, error = %e, "skipping malformed artifact record"),
        }
    }
    records
}
