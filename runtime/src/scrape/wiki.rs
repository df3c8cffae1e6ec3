//! Reference wiki pages: heroes, items, and skills.
//!
//! Every function here is a pure transform from page HTML to records so the
//! page families can be exercised against fixed documents.

use crate::extraction::{cell_text, extract_sections, extract_tables, SectionRule};
use bazaar_core::heroes::{HeroEntry, HERO_ROSTER, MONSTER_OWNER};
use bazaar_core::{
    clean_text, optional_text, parse_number, HeroRecord, ItemRecord, ItemSize, ItemSource,
    SkillRecord, SkillSource,
};
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Item tables: name, effect, cooldown, ammo, types.
pub const ITEM_COLUMNS: usize = 5;
/// Skill tables: sprite, name, effect, tier, types.
pub const SKILL_COLUMNS: usize = 5;

/// Item size sections, in match order.
pub const ITEM_SECTIONS: [SectionRule<ItemSize>; 3] = [
    SectionRule::new("small", ItemSize::Small),
    SectionRule::new("medium", ItemSize::Medium),
    SectionRule::new("large", ItemSize::Large),
];

fn skill_table_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| {
        Selector::parse("#mw-content-text table.wikitable").expect("skill table selector is valid")
    })
}

fn paragraph_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("#mw-content-text p").expect("paragraph selector is valid"))
}

/// Whose item and skill pages are being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOwner {
    Hero(&'static HeroEntry),
    Monster,
}

impl PageOwner {
    /// Every hero in roster order, then the monster pages.
    pub fn all() -> impl Iterator<Item = PageOwner> {
        HERO_ROSTER
            .iter()
            .map(PageOwner::Hero)
            .chain(std::iter::once(PageOwner::Monster))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hero(h) => h.name,
            Self::Monster => MONSTER_OWNER,
        }
    }

    pub fn item_page(&self) -> String {
        format!("{}_Items", self.label())
    }

    pub fn skill_page(&self) -> String {
        format!("{}_Skills", self.label())
    }

    fn hero_id(&self) -> Option<i64> {
        match self {
            Self::Hero(h) => Some(h.id),
            Self::Monster => None,
        }
    }
}

/// Hero record from the hero's own article, falling back to the roster entry.
pub fn parse_hero_page(html: Option<&str>, hero: &HeroEntry) -> HeroRecord {
    let mut record = hero.default_record();
    let Some(html) = html else {
        info!(hero = hero.name, "hero page unavailable, using roster entry");
        return record;
    };

    let document = Html::parse_document(html);
    let first_paragraph = document
        .select(paragraph_selector())
        .map(|p| clean_text(&cell_text(&p)))
        .find(|text| !text.is_empty());
    if let Some(text) = first_paragraph {
        record.description = Some(text);
    } else {
        debug!(hero = hero.name, "hero page has no description paragraph");
    }
    record
}

/// Items from one `<Owner>_Items` page.
pub fn parse_item_page(html: &str, owner: PageOwner) -> Vec<ItemRecord> {
    let document = Html::parse_document(html);
    let source = match owner {
        PageOwner::Hero(_) => ItemSource::HeroSpecific,
        PageOwner::Monster => ItemSource::Monster,
    };

    let mut items = Vec::new();
    for section in extract_sections(&document, &ITEM_SECTIONS, ITEM_COLUMNS) {
        let before = items.len();
        for cells in &section.rows {
            let name = clean_text(&cells[0]);
            if name.is_empty() {
                continue;
            }
            let effect = clean_text(&cells[1]);
            items.push(ItemRecord {
                name,
                description: effect.clone(),
                size: section.category,
                source,
                hero_id: owner.hero_id(),
                monster_id: None,
                cooldown: parse_number(&cells[2]),
                effect,
                cost: None,
                types: optional_text(&cells[4]),
            });
        }
        info!(
            owner = owner.label(),
            size = %section.category,
            count = items.len() - before,
            "item section parsed"
        );
    }
    items
}

/// Skills from one `<Owner>_Skills` page.
pub fn parse_skill_page(html: &str, owner: PageOwner) -> Vec<SkillRecord> {
    let document = Html::parse_document(html);
    let source = match owner {
        PageOwner::Hero(_) => SkillSource::HeroSpecific,
        PageOwner::Monster => SkillSource::Monster,
    };

    let skills: Vec<SkillRecord> = extract_tables(&document, skill_table_selector(), SKILL_COLUMNS)
        .into_iter()
        .filter_map(|cells| {
            let name = clean_text(&cells[1]);
            if name.is_empty() {
                return None;
            }
            Some(SkillRecord {
                name,
                description: clean_text(&cells[2]),
                source,
                hero_id: owner.hero_id(),
                monster_id: None,
                tier: optional_text(&cells[3]),
                effect: optional_text(&cells[2]),
                types: optional_text(&cells[4]),
            })
        })
        .collect();
    if skills.is_empty() {
        warn!(owner = owner.label(), "no skill tables found");
    } else {
        info!(owner = owner.label(), count = skills.len(), "skill page parsed");
    }
    skills
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::heroes::find;

    const DOOLEY_ITEMS: &str = r#"
    <html><body><div id="mw-content-text">
      <h2><span class="mw-headline">Small Items</span></h2>
      <table class="wikitable">
        <tr><th>Name</th><th>Effect</th><th>Cooldown</th><th>Ammo</th><th>Types</th></tr>
        <tr><td> Battery </td><td>Charge an item 1 second</td><td>5s</td><td>–</td><td>Tech</td></tr>
        <tr><td>Fragment</td><td>only two</td></tr>
        <tr><td></td><td>no name</td><td>1</td><td>–</td><td></td></tr>
      </table>
      <h2><span class="mw-headline">Medium Items</span></h2>
      <table class="wikitable">
        <tr><td>Critical Core</td><td>Your Core has +20% Crit Chance</td><td>–</td><td>–</td><td></td></tr>
      </table>
    </div></body></html>
    "#;

    #[test]
    fn test_parse_item_page() {
        let dooley = find("Dooley").unwrap();
        let items = parse_item_page(DOOLEY_ITEMS, PageOwner::Hero(dooley));
        assert_eq!(items.len(), 2);

        let battery = &items[0];
        assert_eq!(battery.name, "Battery");
        assert_eq!(battery.size, ItemSize::Small);
        assert_eq!(battery.source, ItemSource::HeroSpecific);
        assert_eq!(battery.hero_id, Some(1));
        assert_eq!(battery.cooldown, Some(5.0));
        assert_eq!(battery.description, battery.effect);
        assert_eq!(battery.cost, None);
        assert_eq!(battery.types.as_deref(), Some("Tech"));

        let core = &items[1];
        assert_eq!(core.size, ItemSize::Medium);
        assert_eq!(core.cooldown, None);
        assert_eq!(core.types, None);
    }

    #[test]
    fn test_item_effect_is_trimmed_only() {
        let html = r#"<div id="mw-content-text">
          <h2>Small Items</h2>
          <table class="wikitable">
            <tr><td> Pistol </td><td>
              Deal 5 damage.

Haste   1 item </td><td>4</td><td></td><td>Weapon</td></tr>
          </table></div>"#;
        let items = parse_item_page(html, PageOwner::Monster);
        assert_eq!(items[0].name, "Pistol");
        assert_eq!(items[0].effect, "Deal 5 damage.\n\nHaste   1 item");
        assert_eq!(items[0].description, items[0].effect);
    }

    #[test]
    fn test_skill_page_without_tables_is_empty() {
        let html = r#"<div id="mw-content-text"><p>No skills yet.</p></div>"#;
        assert!(parse_skill_page(html, PageOwner::Monster).is_empty());
    }

    #[test]
    fn test_monster_items_have_no_owner_ids() {
        let items = parse_item_page(DOOLEY_ITEMS, PageOwner::Monster);
        assert!(items
            .iter()
            .all(|i| i.source == ItemSource::Monster && i.hero_id.is_none() && i.monster_id.is_none()));
    }

    #[test]
    fn test_parse_skill_page() {
        let html = r#"
        <div id="mw-content-text">
          <table class="wikitable">
            <tr><th></th><th>Name</th><th>Effect</th><th>Tier</th><th>Types</th></tr>
            <tr><td><img src="x.png"></td><td>Bolster</td><td> Gain 10 Shield </td><td>Bronze</td><td>Shield</td></tr>
          </table>
          <table class="wikitable">
            <tr><td></td><td>Overclock</td><td>Haste your items</td><td>Silver</td><td></td></tr>
          </table>
        </div>"#;
        let vanessa = find("Vanessa").unwrap();
        let skills = parse_skill_page(html, PageOwner::Hero(vanessa));
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].name, "Bolster");
        assert_eq!(skills[0].description, "Gain 10 Shield");
        assert_eq!(skills[0].effect.as_deref(), Some("Gain 10 Shield"));
        assert_eq!(skills[0].tier.as_deref(), Some("Bronze"));
        assert_eq!(skills[0].source, SkillSource::HeroSpecific);
        assert_eq!(skills[0].hero_id, Some(3));
        assert_eq!(skills[1].types, None);
    }

    #[test]
    fn test_hero_page_description_and_fallback() {
        let mak = find("Mak").unwrap();
        let html = r#"<div id="mw-content-text"><p>  </p><p>Mak is an alchemist.</p></div>"#;
        let record = parse_hero_page(Some(html), mak);
        assert_eq!(record.description.as_deref(), Some("Mak is an alchemist."));
        assert_eq!(record.slug.as_deref(), Some("mak"));

        let dooley = find("Dooley").unwrap();
        let record = parse_hero_page(None, dooley);
        assert_eq!(
            record.description.as_deref(),
            Some("A resourceful engineer with mechanical expertise")
        );
    }

    #[test]
    fn test_page_owners() {
        let owners: Vec<String> = PageOwner::all().map(|o| o.item_page()).collect();
        assert_eq!(owners.first().map(String::as_str), Some("Dooley_Items"));
        assert_eq!(owners.last().map(String::as_str), Some("Monster_Items"));
        assert_eq!(PageOwner::Monster.skill_page(), "Monster_Skills");
    }
}
