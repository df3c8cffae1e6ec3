//! `bazaar-ingest inspect <page>`: show how a wiki page would be extracted.

use super::output::{print_json, Output};
use crate::acquisition::http_client::HttpFetcher;
use crate::config::IngestConfig;
use crate::extraction::{extract_sections, extract_tables, headings};
use crate::scrape::wiki::{ITEM_COLUMNS, ITEM_SECTIONS, SKILL_COLUMNS};
use anyhow::{Context, Result};
use bazaar_core::Category;
use scraper::{Html, Selector};
use serde::Serialize;

const SAMPLE_ROWS: usize = 3;

#[derive(Debug, Serialize)]
struct PageProbe {
    url: String,
    status: u16,
    headings: Vec<HeadingProbe>,
    sections: Vec<SectionProbe>,
    wikitable_rows: usize,
    wikitable_sample: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HeadingProbe {
    tag: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct SectionProbe {
    heading: String,
    size: &'static str,
    rows: usize,
    sample: Vec<Vec<String>>,
}

/// Fetch one wiki page and report its headings, the item sections they bind
/// to, and the rows a skill-style wikitable scan would yield.
pub async fn run(config: &IngestConfig, page: &str, out: &Output) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.wiki_url, config.http_timeout());
    let url = fetcher.url_for(page);
    let fetched = fetcher
        .get(&url)
        .await
        .with_context(|| format!("could not fetch {url}"))?;

    let probe = probe(&fetched.final_url, fetched.status, &fetched.body)?;
    if out.is_json() {
        print_json(&probe);
    } else {
        print_probe(&probe, out);
    }
    Ok(())
}

fn probe(url: &str, status: u16, body: &str) -> Result<PageProbe> {
    let document = Html::parse_document(body);
    let wikitable = Selector::parse("#mw-content-text table.wikitable")
        .map_err(|e| anyhow::anyhow!("invalid selector: {e}"))?;

    let sections = extract_sections(&document, &ITEM_SECTIONS, ITEM_COLUMNS)
        .into_iter()
        .map(|s| SectionProbe {
            heading: s.heading,
            size: s.category.as_str(),
            rows: s.rows.len(),
            sample: s.rows.into_iter().take(SAMPLE_ROWS).collect(),
        })
        .collect();
    let table_rows = extract_tables(&document, &wikitable, SKILL_COLUMNS);

    Ok(PageProbe {
        url: url.to_string(),
        status,
        headings: headings(&document)
            .into_iter()
            .map(|(tag, text)| HeadingProbe { tag, text })
            .collect(),
        sections,
        wikitable_rows: table_rows.len(),
        wikitable_sample: table_rows.into_iter().take(SAMPLE_ROWS).collect(),
    })
}

fn print_probe(probe: &PageProbe, out: &Output) {
    out.line(format!("  {} (HTTP {})", probe.url, probe.status));
    out.line("");
    out.line(format!("  Headings ({}):", probe.headings.len()));
    for h in &probe.headings {
        out.line(format!("    {:<3} {}", h.tag, h.text));
    }
    out.line("");
    if probe.sections.is_empty() {
        out.line(format!("  {} No item size sections matched", out.warn_sym()));
    }
    for section in &probe.sections {
        out.line(format!(
            "  {} {:?} -> {} ({} rows)",
            out.ok_sym(),
            section.heading,
            section.size,
            section.rows
        ));
        for row in &section.sample {
            out.line(format!("      {}", row.join(" | ")));
        }
    }
    out.line("");
    out.line(format!("  Wikitable rows: {}", probe.wikitable_rows));
    for row in &probe.wikitable_sample {
        out.line(format!("      {}", row.join(" | ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><div id="mw-content-text">
        <h2>Small Items</h2>
        <table class="wikitable">
          <tr><th>Name</th></tr>
          <tr><td>Dagger</td><td>Deal 5</td><td>4</td><td></td><td>Weapon</td></tr>
        </table>
        <h2>Trivia</h2>
      </div></body></html>"#;

    #[test]
    fn test_probe_reports_sections_and_tables() {
        let probe = probe("https://wiki/Vanessa_Items", 200, PAGE).unwrap();
        assert_eq!(probe.headings.len(), 2);
        assert_eq!(probe.sections.len(), 1);
        assert_eq!(probe.sections[0].size, "small");
        assert_eq!(probe.sections[0].rows, 1);
        assert_eq!(probe.wikitable_rows, 1);
        assert_eq!(probe.wikitable_sample[0][0], "Dagger");
    }
}
