//! # Item Catalog
//!
//! Read-only description of everything a player can buy or equip: weapons
//! with their nested skins, armor pieces, attachments and the rarity pricing
//! table used when an item carries no explicit cost.
//!
//! A [`Catalog`] is immutable once built. Reloading produces a new value
//! which is swapped in through [`CatalogHandle`]; commands hold an
//! `Arc<Catalog>` snapshot so a reload never changes prices mid-command.

pub mod defaults;
pub mod loader;

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

pub use loader::{CatalogError, DocumentSource, LoadReport};

/// Skin id that every player owns for every weapon.
pub const DEFAULT_SKIN_ID: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RarityTier {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RarityTier::Common => "Common",
            RarityTier::Rare => "Rare",
            RarityTier::Epic => "Epic",
            RarityTier::Legendary => "Legendary",
        };
        f.write_str(name)
    }
}

/// Fallback cost per rarity tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTable {
    pub common: u64,
    pub rare: u64,
    pub epic: u64,
    pub legendary: u64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            common: 250,
            rare: 400,
            epic: 600,
            legendary: 800,
        }
    }
}

impl PricingTable {
    pub fn cost_for(&self, tier: RarityTier) -> u64 {
        match tier {
            RarityTier::Common => self.common,
            RarityTier::Rare => self.rare,
            RarityTier::Epic => self.epic,
            RarityTier::Legendary => self.legendary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorSlot {
    Head,
    Chest,
    Legs,
    Hands,
    Feet,
}

impl ArmorSlot {
    pub const ALL: [ArmorSlot; 5] = [
        ArmorSlot::Head,
        ArmorSlot::Chest,
        ArmorSlot::Legs,
        ArmorSlot::Hands,
        ArmorSlot::Feet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArmorSlot::Head => "head",
            ArmorSlot::Chest => "chest",
            ArmorSlot::Legs => "legs",
            ArmorSlot::Hands => "hands",
            ArmorSlot::Feet => "feet",
        }
    }
}

impl fmt::Display for ArmorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmorSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase();
        ArmorSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == wanted)
            .ok_or_else(|| format!("unknown armor slot '{}'", s))
    }
}

/// Purchasable item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Skin,
    Armor,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Weapon => write!(f, "weapon"),
            ItemKind::Skin => write!(f, "skin"),
            ItemKind::Armor => write!(f, "armor"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "weapon" | "gun" => Ok(ItemKind::Weapon),
            "skin" => Ok(ItemKind::Skin),
            "armor" | "armour" => Ok(ItemKind::Armor),
            other => Err(format!("unknown item kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkinDefinition {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub cost: u64,
    #[serde(default)]
    pub rarity: RarityTier,
    /// Display badge such as "HOT" or "NEW".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

fn default_skin_id() -> String {
    DEFAULT_SKIN_ID.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    pub id: String,
    pub display_name: String,
    /// Item key the host game uses to spawn this weapon.
    pub external_item_key: String,
    #[serde(default)]
    pub base_cost: u64,
    #[serde(default)]
    pub rarity: RarityTier,
    #[serde(default = "default_skin_id")]
    pub default_skin_id: String,
    #[serde(default)]
    pub skins: Vec<SkinDefinition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorDefinition {
    pub id: String,
    pub display_name: String,
    pub slot: ArmorSlot,
    #[serde(default)]
    pub cost: u64,
    #[serde(default)]
    pub rarity: RarityTier,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDefinition {
    pub id: String,
    pub display_name: String,
    /// Attachment slot name on the weapon ("barrel", "magazine", "optic").
    pub slot: String,
}

/// Borrowed view of a purchasable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogItem<'a> {
    Weapon(&'a WeaponDefinition),
    Skin(&'a SkinDefinition),
    Armor(&'a ArmorDefinition),
}

impl<'a> CatalogItem<'a> {
    pub fn kind(&self) -> ItemKind {
        match self {
            CatalogItem::Weapon(_) => ItemKind::Weapon,
            CatalogItem::Skin(_) => ItemKind::Skin,
            CatalogItem::Armor(_) => ItemKind::Armor,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            CatalogItem::Weapon(w) => &w.id,
            CatalogItem::Skin(s) => &s.id,
            CatalogItem::Armor(a) => &a.id,
        }
    }

    pub fn display_name(&self) -> &'a str {
        match self {
            CatalogItem::Weapon(w) => &w.display_name,
            CatalogItem::Skin(s) => &s.display_name,
            CatalogItem::Armor(a) => &a.display_name,
        }
    }
}

/// Counts reported after a load or reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub weapons: usize,
    pub skins: usize,
    pub armor: usize,
    pub attachments: usize,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pricing: PricingTable,
    weapons: Vec<WeaponDefinition>,
    armor: Vec<ArmorDefinition>,
    attachments: Vec<AttachmentDefinition>,
    weapon_index: HashMap<String, usize>,
    armor_index: HashMap<String, usize>,
    attachment_index: HashMap<String, usize>,
    /// skin id -> (weapon position, skin position)
    skin_index: HashMap<String, (usize, usize)>,
}

impl Catalog {
    /// Build a catalog, indexing every entry. Duplicate ids keep the first
    /// definition and log the rest.
    pub fn new(
        pricing: PricingTable,
        weapons: Vec<WeaponDefinition>,
        armor: Vec<ArmorDefinition>,
        attachments: Vec<AttachmentDefinition>,
    ) -> Self {
        let mut weapon_index = HashMap::new();
        let mut kept_weapons = Vec::with_capacity(weapons.len());
        for weapon in weapons {
            if weapon_index.contains_key(&weapon.id) {
                warn!("Duplicate weapon id '{}' in catalog; keeping the first", weapon.id);
                continue;
            }
            weapon_index.insert(weapon.id.clone(), kept_weapons.len());
            kept_weapons.push(weapon);
        }

        let mut skin_index = HashMap::new();
        for (wi, weapon) in kept_weapons.iter().enumerate() {
            for (si, skin) in weapon.skins.iter().enumerate() {
                if skin_index.contains_key(&skin.id) {
                    if skin.id != DEFAULT_SKIN_ID {
                        warn!(
                            "Skin id '{}' listed under more than one weapon; '{}' entry ignored",
                            skin.id, weapon.id
                        );
                    }
                    continue;
                }
                skin_index.insert(skin.id.clone(), (wi, si));
            }
        }

        let mut armor_index = HashMap::new();
        let mut kept_armor = Vec::with_capacity(armor.len());
        for piece in armor {
            if armor_index.contains_key(&piece.id) {
                warn!("Duplicate armor id '{}' in catalog; keeping the first", piece.id);
                continue;
            }
            armor_index.insert(piece.id.clone(), kept_armor.len());
            kept_armor.push(piece);
        }

        let mut attachment_index = HashMap::new();
        for (i, attachment) in attachments.iter().enumerate() {
            attachment_index.entry(attachment.id.clone()).or_insert(i);
        }

        Self {
            pricing,
            weapons: kept_weapons,
            armor: kept_armor,
            attachments,
            weapon_index,
            armor_index,
            attachment_index,
            skin_index,
        }
    }

    /// Catalog compiled into the binary.
    pub fn builtin() -> Self {
        Self::new(
            PricingTable::default(),
            defaults::weapons(),
            defaults::armor(),
            defaults::attachments(),
        )
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn weapons(&self) -> &[WeaponDefinition] {
        &self.weapons
    }

    pub fn armor_pieces(&self) -> &[ArmorDefinition] {
        &self.armor
    }

    pub fn attachments(&self) -> &[AttachmentDefinition] {
        &self.attachments
    }

    pub fn weapon(&self, id: &str) -> Option<&WeaponDefinition> {
        self.weapon_index.get(id).map(|&i| &self.weapons[i])
    }

    pub fn skin(&self, id: &str) -> Option<&SkinDefinition> {
        self.skin_index
            .get(id)
            .map(|&(wi, si)| &self.weapons[wi].skins[si])
    }

    pub fn armor(&self, id: &str) -> Option<&ArmorDefinition> {
        self.armor_index.get(id).map(|&i| &self.armor[i])
    }

    pub fn attachment(&self, id: &str) -> Option<&AttachmentDefinition> {
        self.attachment_index.get(id).map(|&i| &self.attachments[i])
    }

    pub fn get(&self, kind: ItemKind, id: &str) -> Option<CatalogItem<'_>> {
        match kind {
            ItemKind::Weapon => self.weapon(id).map(CatalogItem::Weapon),
            ItemKind::Skin => self.skin(id).map(CatalogItem::Skin),
            ItemKind::Armor => self.armor(id).map(CatalogItem::Armor),
        }
    }

    /// Ids of one kind in catalog order.
    pub fn all_ids(&self, kind: ItemKind) -> Vec<&str> {
        match kind {
            ItemKind::Weapon => self.weapons.iter().map(|w| w.id.as_str()).collect(),
            ItemKind::Armor => self.armor.iter().map(|a| a.id.as_str()).collect(),
            ItemKind::Skin => self
                .weapons
                .iter()
                .enumerate()
                .flat_map(|(wi, w)| {
                    w.skins
                        .iter()
                        .enumerate()
                        .map(move |(si, s)| (wi, si, s.id.as_str()))
                })
                .filter(|(wi, si, id)| self.skin_index.get(*id) == Some(&(*wi, *si)))
                .map(|(_, _, id)| id)
                .collect(),
        }
    }

    /// Skins offered for one weapon; empty when the weapon is unknown.
    pub fn skins_for(&self, weapon_id: &str) -> &[SkinDefinition] {
        self.weapon(weapon_id)
            .map(|w| w.skins.as_slice())
            .unwrap_or(&[])
    }

    pub fn weapon_offers_skin(&self, weapon_id: &str, skin_id: &str) -> bool {
        self.skins_for(weapon_id).iter().any(|s| s.id == skin_id)
    }

    pub fn armor_for_slot(&self, slot: ArmorSlot) -> impl Iterator<Item = &ArmorDefinition> + '_ {
        self.armor.iter().filter(move |a| a.slot == slot)
    }

    /// Effective price: explicit cost when set, otherwise the tier price.
    /// The default skin is always free.
    pub fn price_of(&self, item: CatalogItem<'_>) -> u64 {
        match item {
            CatalogItem::Skin(s) if s.id == DEFAULT_SKIN_ID => 0,
            CatalogItem::Skin(s) => self.explicit_or_tier(s.cost, s.rarity),
            CatalogItem::Weapon(w) => self.explicit_or_tier(w.base_cost, w.rarity),
            CatalogItem::Armor(a) => self.explicit_or_tier(a.cost, a.rarity),
        }
    }

    fn explicit_or_tier(&self, cost: u64, rarity: RarityTier) -> u64 {
        if cost > 0 {
            cost
        } else {
            self.pricing.cost_for(rarity)
        }
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            weapons: self.weapons.len(),
            skins: self.skin_index.len(),
            armor: self.armor.len(),
            attachments: self.attachments.len(),
        }
    }
}

/// Shared, swappable reference to the current catalog.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<Catalog>>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(catalog))),
        }
    }

    /// Consistent view for the duration of one command.
    pub fn snapshot(&self) -> Arc<Catalog> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    pub fn publish(&self, catalog: Catalog) {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        *guard = Arc::new(catalog);
    }

    /// Re-read the catalog documents from `dir` and swap them in. Missing or
    /// malformed documents fall back to the built-in set, so the handle
    /// always ends up with a usable catalog.
    pub fn reload(&self, dir: &Path) -> LoadReport {
        let (catalog, report) = loader::load_or_default(dir);
        self.publish(catalog);
        report
    }
}
