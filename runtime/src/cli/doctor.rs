//! Environment readiness check.

use super::output::{print_json, Output};
use crate::config::IngestConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct DoctorReport {
    os: &'static str,
    arch: &'static str,
    chromium: Option<PathBuf>,
    config_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_error: Option<String>,
    output_dir: PathBuf,
    output_dir_writable: bool,
    db_path: PathBuf,
    db_exists: bool,
    ready: bool,
}

/// Check Chromium availability, the configured URLs, and the output and
/// database locations.
pub async fn run(config: &IngestConfig, out: &Output) -> Result<()> {
    let chromium = config
        .chromium_path
        .clone()
        .filter(|p| p.exists())
        .or_else(find_chromium);
    let config_error = config.validate().err().map(|e| e.to_string());
    let output_dir_writable = is_writable_dir(&config.output_dir);

    let report = DoctorReport {
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        ready: config_error.is_none() && output_dir_writable,
        config_valid: config_error.is_none(),
        config_error,
        chromium,
        output_dir: config.output_dir.clone(),
        output_dir_writable,
        db_path: config.db_path.clone(),
        db_exists: config.db_path.exists(),
    };

    if out.is_json() {
        print_json(&report);
        return Ok(());
    }

    out.line("Bazaar Ingest Doctor");
    out.line("====================");
    out.line("");
    out.line(format!("OS:   {}", report.os));
    out.line(format!("Arch: {}", report.arch));
    out.line("");

    match &report.chromium {
        Some(path) => out.line(format!("{} Chromium found: {}", out.ok_sym(), path.display())),
        None => out.line(format!(
            "{} Chromium NOT found. Monster and merchant pages need it; use --http-only without it.",
            out.warn_sym()
        )),
    }
    match &report.config_error {
        None => out.line(format!(
            "{} Sources: {} , {}",
            out.ok_sym(),
            config.wiki_url,
            config.render_url
        )),
        Some(e) => out.line(format!("{} {e}", out.warn_sym())),
    }
    if report.output_dir_writable {
        out.line(format!(
            "{} Output directory {} is writable",
            out.ok_sym(),
            report.output_dir.display()
        ));
    } else {
        out.line(format!(
            "{} Output directory {} is not writable",
            out.warn_sym(),
            report.output_dir.display()
        ));
    }
    let db_state = if report.db_exists { "exists" } else { "will be created" };
    out.line(format!(
        "{} Database {} ({db_state})",
        out.ok_sym(),
        report.db_path.display()
    ));

    out.line("");
    if report.ready {
        out.line("Status: READY");
    } else {
        out.line("Status: NOT READY");
    }
    Ok(())
}

/// A directory is usable if it exists and is writable, or if its nearest
/// existing ancestor is.
fn is_writable_dir(dir: &Path) -> bool {
    let mut candidate = Some(dir);
    while let Some(path) = candidate {
        if path.as_os_str().is_empty() {
            candidate = Some(Path::new("."));
            continue;
        }
        if path.exists() {
            return std::fs::metadata(path)
                .map(|m| m.is_dir() && !m.permissions().readonly())
                .unwrap_or(false);
        }
        candidate = path.parent();
    }
    false
}
