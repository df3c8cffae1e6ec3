//! Bazaar core: canonical reference-data records, category normalization, and the hero roster.

pub mod heroes;
pub mod normalize;
pub mod types;

pub use heroes::{HeroEntry, HERO_ROSTER, MONSTER_OWNER};
pub use normalize::{category, clean_text, optional_text, parse_day, parse_number, FallbackCounter};
pub use types::*;
