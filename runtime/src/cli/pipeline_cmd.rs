//! `bazaar-ingest run | scrape | import`.

use super::output::{print_json, Output};
use crate::acquisition::http_client::HttpFetcher;
use crate::checkpoint::ArtifactStore;
use crate::config::IngestConfig;
use crate::pipeline::{Mode, Pipeline, RunReport};
use crate::renderer::chromium::ChromiumLauncher;
use crate::renderer::session::BrowserSession;
use crate::renderer::{Launcher, NoopLauncher};
use crate::scrape::BazaarScraper;
use crate::store::{MemoryStore, SqliteStore, Store};
use anyhow::{Context, Result};
use bazaar_core::EntityKind;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub mode: Mode,
    /// Entity types to process; empty means all.
    pub only: Vec<EntityKind>,
    /// Import into a throwaway in-memory store.
    pub dry_run: bool,
    /// Never start a browser; rendered pages come back empty.
    pub http_only: bool,
}

impl PipelineOptions {
    fn selected(&self) -> Vec<EntityKind> {
        if self.only.is_empty() {
            EntityKind::ALL.to_vec()
        } else {
            self.only.clone()
        }
    }

    fn needs_browser(&self) -> bool {
        !self.http_only
            && self.mode != Mode::ImportOnly
            && self
                .selected()
                .iter()
                .any(|k| matches!(k, EntityKind::Monster | EntityKind::Merchant))
    }
}

/// Run the pipeline and print its report. Returns the run's success.
pub async fn run(config: &IngestConfig, opts: &PipelineOptions, out: &Output) -> Result<bool> {
    let store: Arc<dyn Store> = if opts.dry_run || opts.mode == Mode::ScrapeOnly {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            SqliteStore::open(&config.db_path)
                .with_context(|| format!("cannot open database {}", config.db_path.display()))?,
        )
    };

    let launcher: Arc<dyn Launcher> = if opts.http_only {
        Arc::new(NoopLauncher)
    } else {
        Arc::new(ChromiumLauncher::new(config))
    };
    let session = Arc::new(BrowserSession::new(
        launcher,
        &config.render_url,
        config.timeouts,
    ));
    if opts.needs_browser() {
        session
            .initialize()
            .await
            .context("failed to start the headless browser (use --http-only to skip it)")?;
    }

    let wiki = Arc::new(HttpFetcher::new(&config.wiki_url, config.http_timeout()));
    let scraper = Arc::new(BazaarScraper::new(wiki, session.clone()));
    let pipeline = Pipeline::new(scraper, store, ArtifactStore::new(&config.output_dir));

    let report = pipeline.run(&opts.selected(), opts.mode).await;
    session.close().await;
    info!(run_id = %report.run_id, "run complete");

    if out.is_json() {
        print_json(&report);
    } else {
        print_report(&report, out);
    }
    Ok(report.success)
}

fn print_report(report: &RunReport, out: &Output) {
    out.line(format!("  Run {} ({:?})", report.run_id, report.mode));
    out.line("");
    for step in &report.steps {
        let mut line = format!(
            "  {:<9} scraped {:>4}  created {:>4}  skipped {:>4}",
            step.kind.plural(),
            step.scraped,
            step.created,
            step.skipped
        );
        if step.rolled_back {
            line.push_str("  (rolled back)");
        }
        if let Some(err) = &step.error {
            line.push_str(&format!("  error: {err}"));
        }
        out.line(line);
    }
    if !report.fallbacks.is_empty() {
        out.line("");
        out.line("  Category fallbacks:");
        for (field, n) in report.fallbacks.iter() {
            out.line(format!("    {field:<24} {n}"));
        }
    }
    out.line("");
    if report.success {
        out.line(format!("  {} Status: OK", out.ok_sym()));
    } else {
        out.line(format!("  {} Status: NOTHING PERSISTED", out.warn_sym()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(mode: Mode, only: Vec<EntityKind>, http_only: bool) -> PipelineOptions {
        PipelineOptions {
            mode,
            only,
            dry_run: false,
            http_only,
        }
    }

    #[test]
    fn test_empty_selection_means_all() {
        assert_eq!(opts(Mode::Run, vec![], false).selected().len(), 5);
    }

    #[test]
    fn test_browser_only_for_rendered_steps() {
        assert!(opts(Mode::Run, vec![], false).needs_browser());
        assert!(!opts(Mode::Run, vec![], true).needs_browser());
        assert!(!opts(Mode::ImportOnly, vec![], false).needs_browser());
        assert!(!opts(Mode::Run, vec![EntityKind::Hero, EntityKind::Item], false).needs_browser());
        assert!(opts(Mode::ScrapeOnly, vec![EntityKind::Merchant], false).needs_browser());
    }
}
