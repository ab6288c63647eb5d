//! Read-only entity catalog consumed by encounter placement.
//!
//! The real catalog (monsters, magic items, armor, weapons) lives in an
//! external store; the placer only sees it through the [`Catalog`] trait.
//! [`MemoryCatalog`] is the in-process implementation used by the CLI and
//! tests, seeded from a built-in table or a JSON file.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;

/// Errors from catalog access.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown rarity: {0}")]
    UnknownRarity(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Io(_) | CatalogError::Json(_) => ErrorKind::PersistenceFailure,
            CatalogError::Unavailable(_) => ErrorKind::ResourceUnavailable,
            CatalogError::UnknownRarity(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Kinds of entity that can be placed on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Monster,
    MagicItem,
    Armor,
    Weapon,
}

impl EntityType {
    /// Plural label used in logs and requests.
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Monster => "Monsters",
            EntityType::MagicItem => "Magic Items",
            EntityType::Armor => "Armor",
            EntityType::Weapon => "Weapons",
        }
    }

    /// Fallback map glyph for an entity without a usable name.
    pub fn glyph(&self) -> char {
        match self {
            EntityType::Monster => 'M',
            EntityType::MagicItem => 'I',
            EntityType::Armor => 'A',
            EntityType::Weapon => 'W',
        }
    }

    /// Marker colour on the rendered map.
    pub fn color(&self) -> [u8; 3] {
        match self {
            EntityType::Monster => [0xFF, 0x00, 0x00],
            EntityType::MagicItem => [0x00, 0xFF, 0x00],
            EntityType::Armor => [0x00, 0x00, 0xFF],
            EntityType::Weapon => [0xFF, 0xFF, 0x00],
        }
    }

    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Monster,
            EntityType::MagicItem,
            EntityType::Armor,
            EntityType::Weapon,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Magic item rarity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Very Rare")]
    VeryRare,
    Legendary,
    Artifact,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::VeryRare => "Very Rare",
            Rarity::Legendary => "Legendary",
            Rarity::Artifact => "Artifact",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Rarity {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "veryrare" => Ok(Rarity::VeryRare),
            "legendary" => Ok(Rarity::Legendary),
            "artifact" => Ok(Rarity::Artifact),
            _ => Err(CatalogError::UnknownRarity(s.to_string())),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub entity_type: EntityType,
    /// Hit points as stored by the catalog; may be missing or non-numeric.
    #[serde(default)]
    pub hp: Option<String>,
    /// Challenge rating text, e.g. "2" or "1/4".
    #[serde(default)]
    pub cr: Option<String>,
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub category: Option<String>,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            hp: None,
            cr: None,
            rarity: None,
            category: None,
        }
    }

    pub fn with_hp(mut self, hp: impl Into<String>) -> Self {
        self.hp = Some(hp.into());
        self
    }

    pub fn with_cr(mut self, cr: impl Into<String>) -> Self {
        self.cr = Some(cr.into());
        self
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Numeric hit points, if the catalog value is a number.
    ///
    /// Floats are truncated; anything else (including "7 (2d6)") is `None`.
    pub fn hit_points(&self) -> Option<i32> {
        let raw = self.hp.as_deref()?.trim();
        raw.parse::<i32>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v as i32))
    }

    /// Challenge rating as a number; understands "1/2"-style fractions.
    pub fn challenge_rating(&self) -> Option<f32> {
        let raw = self.cr.as_deref()?.trim();
        if let Some((num, den)) = raw.split_once('/') {
            let num: f32 = num.trim().parse().ok()?;
            let den: f32 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            return Some(num / den);
        }
        raw.parse().ok()
    }
}

/// Query filter applied by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityFilter {
    /// Every record of the type.
    Any,
    /// Records whose challenge rating is known and at most this value.
    MaxChallengeRating(f32),
    /// Records whose rarity is one of these.
    Rarities(Vec<Rarity>),
}

impl EntityFilter {
    pub fn matches(&self, record: &EntityRecord) -> bool {
        match self {
            EntityFilter::Any => true,
            EntityFilter::MaxChallengeRating(max) => record
                .challenge_rating()
                .map(|cr| cr <= *max)
                .unwrap_or(false),
            EntityFilter::Rarities(allowed) => record
                .rarity
                .map(|r| allowed.contains(&r))
                .unwrap_or(false),
        }
    }
}

/// Read-only lookup of entity records.
pub trait Catalog {
    /// Up to `limit` records of `entity_type` matching `filter`, in catalog order.
    fn query(
        &self,
        entity_type: EntityType,
        filter: &EntityFilter,
        limit: usize,
    ) -> Result<Vec<EntityRecord>, CatalogError>;
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    records: Vec<EntityRecord>,
}

impl MemoryCatalog {
    pub fn new(records: Vec<EntityRecord>) -> Self {
        Self { records }
    }

    /// The built-in starter catalog.
    pub fn standard() -> Self {
        Self::new(STANDARD_ENTITIES.clone())
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<EntityRecord> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    /// Load a JSON array of records from disk.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json_str(&content)
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn query(
        &self,
        entity_type: EntityType,
        filter: &EntityFilter,
        limit: usize,
    ) -> Result<Vec<EntityRecord>, CatalogError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.entity_type == entity_type && filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }
}

fn monster(name: &str, hp: &str, cr: &str, category: &str) -> EntityRecord {
    EntityRecord::new(name, EntityType::Monster)
        .with_hp(hp)
        .with_cr(cr)
        .with_category(category)
}

fn magic_item(name: &str, rarity: Rarity, category: &str) -> EntityRecord {
    EntityRecord::new(name, EntityType::MagicItem)
        .with_rarity(rarity)
        .with_category(category)
}

lazy_static::lazy_static! {
    /// Starter records used when no catalog file is configured.
    pub static ref STANDARD_ENTITIES: Vec<EntityRecord> = vec![
        // Monsters
        monster("Goblin", "7", "1/4", "Humanoid"),
        monster("Kobold", "5", "1/8", "Humanoid"),
        monster("Wolf", "11", "1/4", "Beast"),
        monster("Orc", "15", "1/2", "Humanoid"),
        monster("Bugbear", "27", "1", "Humanoid"),
        monster("Ghoul", "22", "1", "Undead"),
        monster("Giant Spider", "26", "1", "Beast"),
        monster("Ogre", "59", "2", "Giant"),
        monster("Gelatinous Cube", "84", "2", "Ooze"),
        monster("Owlbear", "59", "3", "Monstrosity"),
        monster("Wight", "45", "3", "Undead"),
        monster("Troll", "84", "5", "Giant"),
        monster("Hill Giant", "105", "5", "Giant"),
        monster("Young Green Dragon", "136", "8", "Dragon"),
        monster("Stone Golem", "178", "10", "Construct"),
        // Magic Items
        magic_item("Potion of Healing", Rarity::Common, "Potion"),
        magic_item("Bag of Holding", Rarity::Uncommon, "Wondrous Item"),
        magic_item("Cloak of Elvenkind", Rarity::Uncommon, "Wondrous Item"),
        magic_item("Ring of Protection", Rarity::Rare, "Ring"),
        magic_item("Flame Tongue", Rarity::Rare, "Weapon"),
        magic_item("Staff of Power", Rarity::VeryRare, "Staff"),
        magic_item("Vorpal Sword", Rarity::Legendary, "Weapon"),
        // Armor
        EntityRecord::new("Leather Armor", EntityType::Armor).with_category("Light"),
        EntityRecord::new("Chain Shirt", EntityType::Armor).with_category("Medium"),
        EntityRecord::new("Scale Mail", EntityType::Armor).with_category("Medium"),
        EntityRecord::new("Chain Mail", EntityType::Armor).with_category("Heavy"),
        EntityRecord::new("Plate", EntityType::Armor).with_category("Heavy"),
        EntityRecord::new("Shield", EntityType::Armor).with_category("Shield"),
        // Weapons
        EntityRecord::new("Dagger", EntityType::Weapon).with_category("Simple Melee"),
        EntityRecord::new("Mace", EntityType::Weapon).with_category("Simple Melee"),
        EntityRecord::new("Shortbow", EntityType::Weapon).with_category("Simple Ranged"),
        EntityRecord::new("Longsword", EntityType::Weapon).with_category("Martial Melee"),
        EntityRecord::new("Greataxe", EntityType::Weapon).with_category("Martial Melee"),
        EntityRecord::new("Longbow", EntityType::Weapon).with_category("Martial Ranged"),
    ];
}
