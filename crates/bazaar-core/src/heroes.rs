//! Static hero roster.
//!
//! Scrapers resolve hero references through this table rather than querying
//! the store mid-scrape. The ids are the identities the store assigns when
//! the roster is imported in order into an empty store.

use crate::types::HeroRecord;

/// Page owner used for monster item and skill pages.
pub const MONSTER_OWNER: &str = "Monster";

/// One playable hero and where its reference pages live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroEntry {
    pub id: i64,
    pub name: &'static str,
    /// Built-in description used when the hero page cannot be fetched.
    pub description: Option<&'static str>,
}

impl HeroEntry {
    pub fn slug(&self) -> String {
        self.name.to_lowercase()
    }

    /// The record emitted when nothing better could be scraped.
    pub fn default_record(&self) -> HeroRecord {
        HeroRecord {
            name: self.name.to_string(),
            slug: Some(self.slug()),
            description: self.description.map(str::to_string),
        }
    }
}

pub const HERO_ROSTER: &[HeroEntry] = &[
    HeroEntry {
        id: 1,
        name: "Dooley",
        description: Some("A resourceful engineer with mechanical expertise"),
    },
    HeroEntry {
        id: 2,
        name: "Pygmalien",
        description: Some("A magical sculptor who can bring creations to life"),
    },
    HeroEntry {
        id: 3,
        name: "Vanessa",
        description: Some("A skilled marine biologist who commands aquatic creatures"),
    },
    HeroEntry {
        id: 4,
        name: "Mak",
        description: None,
    },
    HeroEntry {
        id: 5,
        name: "Stelle",
        description: None,
    },
    HeroEntry {
        id: 6,
        name: "Jules",
        description: None,
    },
];

/// Look up a roster entry by name, case-insensitively.
pub fn find(name: &str) -> Option<&'static HeroEntry> {
    let name = name.trim();
    HERO_ROSTER.iter().find(|h| h.name.eq_ignore_ascii_case(name))
}
