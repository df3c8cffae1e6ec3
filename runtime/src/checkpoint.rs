//! Durable JSON checkpoints between scrape and import.
//!
//! One pretty-printed array per entity type. A run that dies after scraping
//! can be resumed with an import-only pass over these files.

use crate::error::{IngestError, IngestResult};
use bazaar_core::{EntityBatch, EntityKind};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(kind.artifact_file())
    }

    /// Write `batch` to its artifact, replacing any previous one.
    ///
    /// Empty batches leave the existing artifact alone and return `None`.
    pub fn write(&self, batch: &EntityBatch) -> IngestResult<Option<PathBuf>> {
        let kind = batch.kind();
        if batch.is_empty() {
            debug!(entity = %kind, "empty batch, no artifact written");
            return Ok(None);
        }
        let json = match batch {
            EntityBatch::Heroes(v) => to_pretty(v),
            EntityBatch::Items(v) => to_pretty(v),
            EntityBatch::Skills(v) => to_pretty(v),
            EntityBatch::Monsters(v) => to_pretty(v),
            EntityBatch::Merchants(v) => to_pretty(v),
        }?;

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            IngestError::Artifact(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let path = self.path_for(kind);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| IngestError::Artifact(format!("cannot write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            IngestError::Artifact(format!("cannot move artifact into {}: {e}", path.display()))
        })?;

        info!(entity = %kind, path = %path.display(), count = batch.len(), "artifact written");
        Ok(Some(path))
    }

    /// Raw records of `kind`, or `None` when no artifact exists.
    pub fn read(&self, kind: EntityKind) -> IngestResult<Option<Vec<Value>>> {
        let path = self.path_for(kind);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(IngestError::Artifact(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        let records: Vec<Value> = serde_json::from_str(&text).map_err(|e| {
            IngestError::Artifact(format!("{} is not a JSON array: {e}", path.display()))
        })?;
        Ok(Some(records))
    }
}

fn to_pretty<T: Serialize>(records: &[T]) -> IngestResult<String> {
    serde_json::to_string_pretty(records)
        .map_err(|e| IngestError::Artifact(format!("cannot serialize records: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{HeroRecord, MonsterRecord};
    use tempfile::TempDir;

    fn heroes() -> EntityBatch {
        EntityBatch::Heroes(vec![HeroRecord {
            name: "Dooley".into(),
            slug: Some("dooley".into()),
            description: None,
        }])
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path().join("data"));
        let path = store.write(&heroes()).unwrap().unwrap();
        assert!(path.ends_with("heroes.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {"));

        let records = store.read(EntityKind::Hero).unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Dooley");
        assert!(!tmp.path().join("data/heroes.json.tmp").exists());
    }

    #[test]
    fn test_empty_batch_keeps_previous_artifact() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        store.write(&heroes()).unwrap();
        assert_eq!(store.write(&EntityBatch::Heroes(vec![])).unwrap(), None);
        assert!(store.read(EntityKind::Hero).unwrap().is_some());
    }

    #[test]
    fn test_missing_artifact_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        assert!(store.read(EntityKind::Monster).unwrap().is_none());
        store
            .write(&EntityBatch::Monsters(vec![MonsterRecord {
                name: "Dire Inglet".into(),
                description: None,
                appears_on_day: Some(2),
            }]))
            .unwrap();
        assert!(store.read(EntityKind::Monster).unwrap().is_some());
    }

    #[test]
    fn test_malformed_artifact_is_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("items.json"), "{not json").unwrap();
        let store = ArtifactStore::new(tmp.path());
        assert!(matches!(
            store.read(EntityKind::Item),
            Err(IngestError::Artifact(_))
        ));
    }
}
