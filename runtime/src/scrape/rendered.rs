//! Companion site pages that need a browser: monsters and merchants.
//!
//! Both pages are sparse upstream. An empty batch is the normal outcome when
//! no table has been published yet.

use crate::extraction::extract_tables;
use bazaar_core::{
    category, clean_text, optional_text, parse_day, FallbackCounter, MerchantRecord, MerchantType,
    MonsterRecord,
};
use scraper::{Html, Selector};
use std::sync::OnceLock;

pub const MONSTERS_PATH: &str = "/monsters";
pub const MERCHANTS_PATH: &str = "/merchants";
/// Selector awaited after load on companion site pages.
pub const WAIT_SELECTOR: &str = "body";

/// Monster rows: name, day, description.
pub const MONSTER_COLUMNS: usize = 1;
/// Merchant rows: name, type, day, description.
pub const MERCHANT_COLUMNS: usize = 2;

fn any_table() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("table").expect("table selector is valid"))
}

fn cell(cells: &[String], idx: usize) -> &str {
    cells.get(idx).map(String::as_str).unwrap_or("")
}

pub fn parse_monster_page(html: &str) -> Vec<MonsterRecord> {
    let document = Html::parse_document(html);
    extract_tables(&document, any_table(), MONSTER_COLUMNS)
        .into_iter()
        .filter_map(|cells| {
            let name = clean_text(cell(&cells, 0));
            (!name.is_empty()).then(|| MonsterRecord {
                name,
                appears_on_day: parse_day(cell(&cells, 1)),
                description: optional_text(cell(&cells, 2)),
            })
        })
        .collect()
}

pub fn parse_merchant_page(html: &str, fallbacks: &mut FallbackCounter) -> Vec<MerchantRecord> {
    let document = Html::parse_document(html);
    let mut merchants = Vec::new();
    for cells in extract_tables(&document, any_table(), MERCHANT_COLUMNS) {
        let name = clean_text(cell(&cells, 0));
        if name.is_empty() {
            continue;
        }
        merchants.push(MerchantRecord {
            name,
            merchant_type: category::<MerchantType>(cell(&cells, 1), fallbacks),
            appears_on_day: parse_day(cell(&cells, 2)),
            description: optional_text(cell(&cells, 3)),
        });
    }
    merchants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monsters() {
        let html = r#"
        <table>
          <tr><th>Monster</th><th>Day</th><th>Notes</th></tr>
          <tr><td>Fanged Inglet</td><td>Day 1</td><td>Bites</td></tr>
          <tr><td>Lord Arken</td></tr>
          <tr><td> </td><td>2</td></tr>
        </table>"#;
        let monsters = parse_monster_page(html);
        assert_eq!(monsters.len(), 2);
        assert_eq!(monsters[0].appears_on_day, Some(1));
        assert_eq!(monsters[0].description.as_deref(), Some("Bites"));
        assert_eq!(monsters[1].name, "Lord Arken");
        assert_eq!(monsters[1].appears_on_day, None);
    }

    #[test]
    fn test_parse_merchants_counts_fallbacks() {
        let html = r#"
        <table>
          <tr><td>Chris</td><td>Level Up</td><td>5</td><td>Sells upgrades</td></tr>
          <tr><td>Pyro</td><td>Wandering</td></tr>
          <tr><td>Lonely</td></tr>
        </table>"#;
        let mut fallbacks = FallbackCounter::new();
        let merchants = parse_merchant_page(html, &mut fallbacks);
        assert_eq!(merchants.len(), 2);
        assert_eq!(merchants[0].merchant_type, MerchantType::LevelUp);
        assert_eq!(merchants[0].appears_on_day, Some(5));
        assert_eq!(merchants[1].merchant_type, MerchantType::Regular);
        assert_eq!(fallbacks.get("merchant.merchant_type"), 1);
    }

    #[test]
    fn test_page_without_tables_is_empty() {
        let mut fallbacks = FallbackCounter::new();
        assert!(parse_monster_page("<div>Coming soon</div>").is_empty());
        assert!(parse_merchant_page("<div>Coming soon</div>", &mut fallbacks).is_empty());
    }
}
