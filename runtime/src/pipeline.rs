//! Orchestrator: scrape, checkpoint, and import each entity type in turn.
//!
//! Steps run sequentially in dependency order. A step that errors or panics
//! is recorded with zero counts and the remaining steps still run. A run
//! succeeds when any step made progress.

use crate::checkpoint::ArtifactStore;
use crate::error::IngestResult;
use crate::import::{ImportSummary, Importer};
use crate::scrape::Scraper;
use crate::store::Store;
use bazaar_core::{EntityKind, FallbackCounter};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Which halves of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Scrape, checkpoint, then import.
    Run,
    /// Scrape and checkpoint only.
    ScrapeOnly,
    /// Import existing checkpoints only.
    ImportOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub kind: EntityKind,
    pub scraped: usize,
    pub created: usize,
    pub skipped: usize,
    pub rolled_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            scraped: 0,
            created: 0,
            skipped: 0,
            rolled_back: false,
            artifact: None,
            error: None,
        }
    }

    fn failed(kind: EntityKind, message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::new(kind)
        }
    }

    fn record_import(&mut self, summary: ImportSummary) {
        self.created = summary.created;
        self.skipped = summary.skipped;
        self.rolled_back = summary.rolled_back;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    /// Category values defaulted during the run, by field.
    pub fallbacks: FallbackCounter,
    pub success: bool,
}

impl RunReport {
    pub fn total_created(&self) -> usize {
        self.steps.iter().map(|s| s.created).sum()
    }

    pub fn total_scraped(&self) -> usize {
        self.steps.iter().map(|s| s.scraped).sum()
    }

    pub fn step(&self, kind: EntityKind) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.kind == kind)
    }
}

pub struct Pipeline {
    scraper: Arc<dyn Scraper>,
    importer: Importer,
    artifacts: ArtifactStore,
}

impl Pipeline {
    pub fn new(scraper: Arc<dyn Scraper>, store: Arc<dyn Store>, artifacts: ArtifactStore) -> Self {
        Self {
            scraper,
            importer: Importer::new(store),
            artifacts,
        }
    }

    /// Run the selected entity types. Selection order is ignored; steps
    /// always follow dependency order.
    pub async fn run(&self, selected: &[EntityKind], mode: Mode) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, ?mode, "pipeline started");

        let mut fallbacks = FallbackCounter::new();
        let mut steps = Vec::new();
        for kind in EntityKind::ALL.into_iter().filter(|k| selected.contains(k)) {
            let span = info_span!("entity", entity = %kind);
            let mut step_fallbacks = FallbackCounter::new();
            let outcome = AssertUnwindSafe(self.step(kind, mode, &mut step_fallbacks))
                .catch_unwind()
                .instrument(span)
                .await;

            let report = match outcome {
                Ok(Ok(report)) => report,
                Ok(Err(e)) => {
                    error!(entity = %kind, error = %e, "step failed");
                    StepReport::failed(kind, e.to_string())
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!(entity = %kind, panic = %message, "step panicked");
                    StepReport::failed(kind, format!("panicked: {message}"))
                }
            };
            fallbacks.merge(&step_fallbacks);
            steps.push(report);
        }

        let success = match mode {
            Mode::ScrapeOnly => steps.iter().any(|s| s.artifact.is_some()),
            Mode::Run | Mode::ImportOnly => steps.iter().any(|s| s.created > 0),
        };
        if !fallbacks.is_empty() {
            warn!(total = fallbacks.total(), "category values defaulted");
        }

        let report = RunReport {
            run_id,
            mode,
            started_at,
            finished_at: Utc::now(),
            steps,
            fallbacks,
            success,
        };
        info!(
            %run_id,
            created = report.total_created(),
            scraped = report.total_scraped(),
            success = report.success,
            "pipeline finished"
        );
        report
    }

    async fn step(
        &self,
        kind: EntityKind,
        mode: Mode,
        fallbacks: &mut FallbackCounter,
    ) -> IngestResult<StepReport> {
        let mut report = StepReport::new(kind);

        if mode == Mode::ImportOnly {
            report.record_import(self.importer.import_artifact(&self.artifacts, kind, fallbacks));
            return Ok(report);
        }

        let batch = self.scraper.scrape(kind, fallbacks).await?;
        report.scraped = batch.len();
        if batch.is_empty() {
            info!(entity = %kind, "nothing scraped");
            return Ok(report);
        }

        let written = match self.artifacts.write(&batch) {
            Ok(path) => path,
            Err(e) => {
                warn!(entity = %kind, error = %e, "checkpoint failed");
                report.error = Some(e.to_string());
                None
            }
        };
        report.artifact = written.clone();

        if mode == Mode::Run {
            let summary = match written {
                Some(_) => self.importer.import_artifact(&self.artifacts, kind, fallbacks),
                None => self.importer.import_entity_batch(&batch),
            };
            report.record_import(summary);
        }
        Ok(report)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
