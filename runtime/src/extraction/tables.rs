//! Heuristic table discovery over wiki-style documents.
//!
//! A section heading is bound to a category by lower-cased substring match,
//! first rule wins. Each matched heading reads the nearest table that follows
//! it in document order. Rows are positional: cell `i` is field `i` of the
//! page family, and rows shorter than the family minimum are dropped.

use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Heading elements that introduce a section.
const SECTION_HEADINGS: [&str; 2] = ["h2", "h3"];

fn row_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("tr").expect("row selector is valid"))
}

fn cell_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("td").expect("cell selector is valid"))
}

/// Binds headings containing `needle` to `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRule<C> {
    /// Lower-case text searched for in the normalized heading.
    pub needle: &'static str,
    pub category: C,
}

impl<C> SectionRule<C> {
    pub const fn new(needle: &'static str, category: C) -> Self {
        Self { needle, category }
    }

    fn matches(&self, heading: &str) -> bool {
        heading.contains(self.needle)
    }
}

/// Rows read from the table under one matched heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<C> {
    pub heading: String,
    pub category: C,
    pub rows: Vec<Vec<String>>,
}

/// Text content of an element, whitespace runs collapsed. Used for headings.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Raw text content of a cell. Trimming is left to the field normalizers.
pub fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect()
}

fn is_heading(element: &ElementRef<'_>) -> bool {
    SECTION_HEADINGS.contains(&element.value().name())
}

/// Section headings in document order, as `(tag, text)`.
pub fn headings(document: &Html) -> Vec<(String, String)> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(is_heading)
        .map(|h| (h.value().name().to_string(), element_text(&h)))
        .collect()
}

/// Locate every section whose heading matches one of `rules`.
///
/// A heading that matches no rule is ignored. A matched heading with no
/// table after it yields an empty section.
pub fn extract_sections<C: Copy>(
    document: &Html,
    rules: &[SectionRule<C>],
    min_columns: usize,
) -> Vec<Section<C>> {
    // Headings and tables in one document-order pass.
    let landmarks: Vec<ElementRef<'_>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| is_heading(e) || e.value().name() == "table")
        .collect();

    let mut sections = Vec::new();
    for (idx, element) in landmarks.iter().enumerate() {
        if !is_heading(element) {
            continue;
        }
        let heading = element_text(element);
        let normalized = heading.trim().to_lowercase();
        let Some(rule) = rules.iter().find(|r| r.matches(&normalized)) else {
            continue;
        };

        let table = landmarks[idx + 1..]
            .iter()
            .find(|e| e.value().name() == "table");
        let rows = match table {
            Some(table) => table_rows(table, min_columns),
            None => {
                warn!(heading = %heading, "no table follows matched heading");
                Vec::new()
            }
        };
        debug!(heading = %heading, count = rows.len(), "section extracted");
        sections.push(Section {
            heading,
            category: rule.category,
            rows,
        });
    }
    sections
}

/// Rows of every table matching `selector`, concatenated in document order.
pub fn extract_tables(document: &Html, selector: &Selector, min_columns: usize) -> Vec<Vec<String>> {
    document
        .select(selector)
        .flat_map(|table| table_rows(&table, min_columns))
        .collect()
}

/// Data rows of one table.
///
/// Rows without a `td` are header or separator rows. Rows with fewer than
/// `min_columns` cells are dropped.
pub fn table_rows(table: &ElementRef<'_>, min_columns: usize) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for row in table.select(row_selector()) {
        let cells: Vec<String> = row
            .select(cell_selector())
            .map(|cell| cell_text(&cell))
            .collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < min_columns {
            dropped += 1;
            continue;
        }
        rows.push(cells);
    }
    if dropped > 0 {
        debug!(dropped, min_columns, "short rows dropped");
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Size {
        Small,
        Medium,
        Large,
    }

    const RULES: [SectionRule<Size>; 3] = [
        SectionRule::new("small", Size::Small),
        SectionRule::new("medium", Size::Medium),
        SectionRule::new("large", Size::Large),
    ];

    const ITEM_PAGE: &str = r#"
    <html><body><div id="mw-content-text">
      <h2><span class="mw-headline">Small Items</span><span class="mw-editsection">[edit]</span></h2>
      <table class="wikitable">
        <tr><th>Name</th><th>Effect</th><th>Cooldown</th><th>Ammo</th><th>Types</th></tr>
        <tr><td>Pocket Knife</td><td>Deal 5 damage</td><td>3s</td><td>–</td><td>Weapon</td></tr>
        <tr><td>Broken</td><td>Missing cells</td></tr>
        <tr><td>Spark Plug</td><td>Haste an item</td><td>–</td><td>–</td><td>Tool</td></tr>
      </table>
      <h2>Trivia</h2>
      <h3>Large Enemy Items</h3>
      <table>
        <tr><td>Anchor</td><td>Slow an item</td><td>10</td><td>–</td><td>Aquatic</td></tr>
      </table>
    </div></body></html>
    "#;

    #[test]
    fn test_headings_bind_by_substring() {
        let doc = Html::parse_document(ITEM_PAGE);
        let sections = extract_sections(&doc, &RULES, 5);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].category, Size::Small);
        assert_eq!(sections[0].heading, "Small Items[edit]");
        assert_eq!(sections[1].category, Size::Large);
        assert_eq!(sections[1].heading, "Large Enemy Items");
    }

    #[test]
    fn test_short_rows_dropped_rest_kept() {
        let doc = Html::parse_document(ITEM_PAGE);
        let sections = extract_sections(&doc, &RULES, 5);
        let names: Vec<&str> = sections[0].rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["Pocket Knife", "Spark Plug"]);
        assert_eq!(sections[0].rows[0][2], "3s");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let html = "<h2>Small to Large</h2><table><tr><td>a</td></tr></table>";
        let doc = Html::parse_document(html);
        let sections = extract_sections(&doc, &RULES, 1);
        assert_eq!(sections[0].category, Size::Small);
    }

    #[test]
    fn test_case_insensitive_match() {
        let html = "<h3>  MEDIUM ITEMS </h3><table><tr><td>Crate</td></tr></table>";
        let doc = Html::parse_document(html);
        let sections = extract_sections(&doc, &RULES, 1);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Size::Medium);
        assert_eq!(sections[0].rows, vec![vec!["Crate".to_string()]]);
    }

    #[test]
    fn test_heading_without_table_yields_empty_section() {
        let html = "<table><tr><td>before</td></tr></table><h2>Large Items</h2><p>None yet</p>";
        let doc = Html::parse_document(html);
        let sections = extract_sections(&doc, &RULES, 1);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].rows.is_empty());
    }

    #[test]
    fn test_unmatched_headings_ignored() {
        let html = "<h2>Trivia</h2><table><tr><td>x</td></tr></table>";
        let doc = Html::parse_document(html);
        assert!(extract_sections(&doc, &RULES, 1).is_empty());
    }

    #[test]
    fn test_extract_tables_by_selector() {
        let html = r#"
        <div id="mw-content-text">
          <table class="wikitable"><tr><th>Icon</th></tr><tr><td></td><td>Bolster</td><td>Gain shield</td><td>Bronze</td><td>Tool</td></tr></table>
          <table class="wikitable"><tr><td></td><td>Short</td></tr></table>
        </div>
        <table class="wikitable"><tr><td></td><td>Outside</td><td>x</td><td>Gold</td><td>y</td></tr></table>
        "#;
        let doc = Html::parse_document(html);
        let sel = Selector::parse("#mw-content-text table.wikitable").unwrap();
        let rows = extract_tables(&doc, &sel, 5);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "Bolster");
        assert_eq!(rows[0][0], "");
    }

    #[test]
    fn test_cells_keep_interior_whitespace() {
        let html = "<table><tr><td> Deal 5 damage.\n\nHaste   1 item </td></tr></table>";
        let doc = Html::parse_document(html);
        let sel = Selector::parse("table").unwrap();
        let rows = extract_tables(&doc, &sel, 1);
        assert_eq!(rows[0][0], " Deal 5 damage.\n\nHaste   1 item ");
    }

    #[test]
    fn test_headings_listing() {
        let doc = Html::parse_document(ITEM_PAGE);
        let listed = headings(&doc);
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[2], ("h3".to_string(), "Large Enemy Items".to_string()));
    }
}
