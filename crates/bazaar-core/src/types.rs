//! Core data types for scraped reference entities.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The kinds of reference entity acquired by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Hero,
    Item,
    Skill,
    Monster,
    Merchant,
}

impl EntityKind {
    /// Every kind, in dependency order: heroes before the records that reference them.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Hero,
        EntityKind::Item,
        EntityKind::Skill,
        EntityKind::Monster,
        EntityKind::Merchant,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Item => "item",
            Self::Skill => "skill",
            Self::Monster => "monster",
            Self::Merchant => "merchant",
        }
    }

    /// Plural form, also used as the persisted table name.
    pub fn plural(self) -> &'static str {
        match self {
            Self::Hero => "heroes",
            Self::Item => "items",
            Self::Skill => "skills",
            Self::Monster => "monsters",
            Self::Merchant => "merchants",
        }
    }

    /// File name of the checkpoint artifact for this kind.
    pub fn artifact_file(self) -> String {
        format!("{}.json", self.plural())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    /// Accepts singular or plural names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == needle || k.plural() == needle)
            .ok_or_else(|| CoreError::UnknownKind(s.to_string()))
    }
}

/// A closed set of canonical labels with a documented default for unknown input.
///
/// Labels match case-insensitively after trimming, and spaces or hyphens are
/// accepted in place of underscores (`"Hero Specific"` is `hero_specific`).
pub trait Category: Copy + Default + PartialEq + fmt::Debug + 'static {
    /// Name used when counting fallbacks, e.g. `item.size`.
    const FIELD: &'static str;
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    /// Canonical label.
    fn as_str(self) -> &'static str;

    /// Parse a label, returning `None` when it is outside the known set.
    fn from_label(label: &str) -> Option<Self> {
        let key = canonical_label(label);
        Self::VARIANTS.iter().copied().find(|v| v.as_str() == key)
    }
}

/// Lower-case, trim, and join words with underscores.
pub fn canonical_label(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Whether `label` names a known variant of `T`.
pub fn is_known<T: Category>(label: &str) -> bool {
    T::from_label(label).is_some()
}

/// A category value as stored: a label, or anything else (number, null,
/// object), which is never a known label.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLabel {
    Text(String),
    #[allow(dead_code)]
    Other(serde::de::IgnoredAny),
}

impl StoredLabel {
    fn resolve<T: Category>(self) -> T {
        match self {
            Self::Text(label) => T::from_label(&label).unwrap_or_default(),
            Self::Other(_) => T::default(),
        }
    }
}

// Categories serialize as their canonical label and deserialize leniently:
// a missing, null, non-string, or unknown label yields the category default.
macro_rules! category_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Ok(StoredLabel::deserialize(deserializer)?.resolve())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Physical size of an item on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl Category for ItemSize {
    const FIELD: &'static str = "item.size";
    const VARIANTS: &'static [Self] = &[Self::Small, Self::Medium, Self::Large];

    fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

category_serde!(ItemSize);

/// Where an item can be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemSource {
    HeroSpecific,
    Monster,
    #[default]
    Universal,
}

impl Category for ItemSource {
    const FIELD: &'static str = "item.source";
    const VARIANTS: &'static [Self] = &[Self::HeroSpecific, Self::Monster, Self::Universal];

    fn as_str(self) -> &'static str {
        match self {
            Self::HeroSpecific => "hero_specific",
            Self::Monster => "monster",
            Self::Universal => "universal",
        }
    }
}

category_serde!(ItemSource);

/// Where a skill can be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SkillSource {
    #[default]
    Universal,
    HeroSpecific,
    Monster,
}

impl Category for SkillSource {
    const FIELD: &'static str = "skill.source";
    const VARIANTS: &'static [Self] = &[Self::Universal, Self::HeroSpecific, Self::Monster];

    fn as_str(self) -> &'static str {
        match self {
            Self::Universal => "universal",
            Self::HeroSpecific => "hero_specific",
            Self::Monster => "monster",
        }
    }
}

category_serde!(SkillSource);

/// Kind of merchant encountered during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MerchantType {
    #[default]
    Regular,
    Skill,
    LevelUp,
    DaySpecific,
}

impl Category for MerchantType {
    const FIELD: &'static str = "merchant.merchant_type";
    const VARIANTS: &'static [Self] = &[
        Self::Regular,
        Self::Skill,
        Self::LevelUp,
        Self::DaySpecific,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Skill => "skill",
            Self::LevelUp => "level_up",
            Self::DaySpecific => "day_specific",
        }
    }
}

category_serde!(MerchantType);

/// A playable hero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An item, as listed on a hero or monster item page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub size: ItemSize,
    #[serde(default)]
    pub source: ItemSource,
    #[serde(default)]
    pub hero_id: Option<i64>,
    #[serde(default)]
    pub monster_id: Option<i64>,
    /// Seconds between activations; `None` for passive items.
    #[serde(default)]
    pub cooldown: Option<f64>,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub cost: Option<i64>,
    #[serde(default)]
    pub types: Option<String>,
}

/// A skill, as listed on a hero or monster skill page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: SkillSource,
    #[serde(default)]
    pub hero_id: Option<i64>,
    #[serde(default)]
    pub monster_id: Option<i64>,
    /// Starting tier as printed upstream (Bronze, Silver, ...).
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub types: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub appears_on_day: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant_type: MerchantType,
    #[serde(default)]
    pub appears_on_day: Option<u32>,
}

/// A category-valued field checked for unknown labels when raw records are loaded.
#[derive(Debug, Clone, Copy)]
pub struct CategoryField {
    /// Key of the field in the serialized record.
    pub key: &'static str,
    /// Fallback counter name, matching `Category::FIELD`.
    pub counter: &'static str,
    pub recognizes: fn(&str) -> bool,
}

impl CategoryField {
    pub const fn of<T: Category>(key: &'static str) -> Self {
        Self {
            key,
            counter: T::FIELD,
            recognizes: is_known::<T>,
        }
    }
}

/// A reference record identified by its natural key.
pub trait Entity: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: EntityKind;
    /// Name of the natural-key field.
    const KEY_FIELD: &'static str = "name";
    /// Category fields subject to default-on-miss.
    const CATEGORY_FIELDS: &'static [CategoryField] = &[];

    /// The natural key.
    fn name(&self) -> &str;
}

impl Entity for HeroRecord {
    const KIND: EntityKind = EntityKind::Hero;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for ItemRecord {
    const KIND: EntityKind = EntityKind::Item;
    const CATEGORY_FIELDS: &'static [CategoryField] = &[
        CategoryField::of::<ItemSize>("size"),
        CategoryField::of::<ItemSource>("source"),
    ];

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for SkillRecord {
    const KIND: EntityKind = EntityKind::Skill;
    const CATEGORY_FIELDS: &'static [CategoryField] = &[CategoryField::of::<SkillSource>("source")];

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for MonsterRecord {
    const KIND: EntityKind = EntityKind::Monster;

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for MerchantRecord {
    const KIND: EntityKind = EntityKind::Merchant;
    const CATEGORY_FIELDS: &'static [CategoryField] =
        &[CategoryField::of::<MerchantType>("merchant_type")];

    fn name(&self) -> &str {
        &self.name
    }
}

/// One entity type's worth of scraped records.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityBatch {
    Heroes(Vec<HeroRecord>),
    Items(Vec<ItemRecord>),
    Skills(Vec<SkillRecord>),
    Monsters(Vec<MonsterRecord>),
    Merchants(Vec<MerchantRecord>),
}

impl EntityBatch {
    /// An empty batch of the given kind.
    pub fn empty(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Hero => Self::Heroes(Vec::new()),
            EntityKind::Item => Self::Items(Vec::new()),
            EntityKind::Skill => Self::Skills(Vec::new()),
            EntityKind::Monster => Self::Monsters(Vec::new()),
            EntityKind::Merchant => Self::Merchants(Vec::new()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Heroes(_) => EntityKind::Hero,
            Self::Items(_) => EntityKind::Item,
            Self::Skills(_) => EntityKind::Skill,
            Self::Monsters(_) => EntityKind::Monster,
            Self::Merchants(_) => EntityKind::Merchant,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Heroes(v) => v.len(),
            Self::Items(v) => v.len(),
            Self::Skills(v) => v.len(),
            Self::Monsters(v) => v.len(),
            Self::Merchants(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Errors raised by the core model.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_kind_parse() {
        assert_eq!("items".parse::<EntityKind>().unwrap(), EntityKind::Item);
        assert_eq!(" Hero ".parse::<EntityKind>().unwrap(), EntityKind::Hero);
        assert!("enchantment".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_artifact_file_names() {
        assert_eq!(EntityKind::Hero.artifact_file(), "heroes.json");
        assert_eq!(EntityKind::Merchant.artifact_file(), "merchants.json");
    }

    #[test]
    fn test_category_label_variants() {
        assert_eq!(ItemSource::from_label("Hero Specific"), Some(ItemSource::HeroSpecific));
        assert_eq!(ItemSource::from_label("hero-specific"), Some(ItemSource::HeroSpecific));
        assert_eq!(MerchantType::from_label("LEVEL UP"), Some(MerchantType::LevelUp));
        assert_eq!(ItemSize::from_label("huge"), None);
    }

    #[test]
    fn test_item_serializes_nulls() {
        let item = ItemRecord {
            name: "Hammer".into(),
            description: "Deal 10 damage".into(),
            size: ItemSize::Small,
            source: ItemSource::HeroSpecific,
            hero_id: Some(1),
            monster_id: None,
            cooldown: None,
            effect: "Deal 10 damage".into(),
            cost: None,
            types: Some("Weapon, Tool".into()),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["size"], "small");
        assert_eq!(value["source"], "hero_specific");
        assert!(value["cooldown"].is_null());
        assert!(value["cost"].is_null());
        assert!(value.as_object().unwrap().contains_key("monster_id"));
    }

    #[test]
    fn test_lenient_category_deserialize() {
        let item: ItemRecord = serde_json::from_value(json!({
            "name": "Odd Thing",
            "size": "gigantic",
            "source": null
        }))
        .unwrap();
        assert_eq!(item.size, ItemSize::Medium);
        assert_eq!(item.source, ItemSource::Universal);

        let merchant: MerchantRecord =
            serde_json::from_value(json!({"name": "Chris", "merchant_type": "Day Specific"}))
                .unwrap();
        assert_eq!(merchant.merchant_type, MerchantType::DaySpecific);

        let item: ItemRecord =
            serde_json::from_value(json!({"name": "Numbered", "size": 3, "source": ["x"]}))
                .unwrap();
        assert_eq!(item.size, ItemSize::Medium);
        assert_eq!(item.source, ItemSource::Universal);
    }

    #[test]
    fn test_hero_skips_absent_optionals() {
        let hero = HeroRecord {
            name: "Mak".into(),
            slug: None,
            description: None,
        };
        assert_eq!(serde_json::to_string(&hero).unwrap(), r#"{"name":"Mak"}"#);
    }

    #[test]
    fn test_batch_kind_and_len() {
        let batch = EntityBatch::empty(EntityKind::Monster);
        assert_eq!(batch.kind(), EntityKind::Monster);
        assert!(batch.is_empty());
    }
}
