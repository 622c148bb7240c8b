//! Player profile data model: identity, token balance, owned item sets,
//! saved loadouts and lifetime counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{ArmorSlot, ItemKind, DEFAULT_SKIN_ID};

/// Platform-assigned 64-bit player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(PlayerId)
            .map_err(|_| format!("invalid player id '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponSlot {
    Primary,
    Secondary,
}

impl fmt::Display for WeaponSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaponSlot::Primary => write!(f, "primary"),
            WeaponSlot::Secondary => write!(f, "secondary"),
        }
    }
}

impl FromStr for WeaponSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" | "1" => Ok(WeaponSlot::Primary),
            "secondary" | "2" => Ok(WeaponSlot::Secondary),
            other => Err(format!("unknown weapon slot '{}'", other)),
        }
    }
}

/// Named equipment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    pub name: String,
    pub primary_weapon_id: String,
    pub secondary_weapon_id: String,
    /// attachment slot -> attachment id
    #[serde(default)]
    pub primary_attachments: BTreeMap<String, String>,
    #[serde(default)]
    pub secondary_attachments: BTreeMap<String, String>,
    /// weapon id -> skin id
    #[serde(default)]
    pub skin_assignments: BTreeMap<String, String>,
    #[serde(default)]
    pub armor_head: Option<String>,
    #[serde(default)]
    pub armor_chest: Option<String>,
    #[serde(default)]
    pub armor_legs: Option<String>,
    #[serde(default)]
    pub armor_hands: Option<String>,
    #[serde(default)]
    pub armor_feet: Option<String>,
}

impl Loadout {
    /// The loadout every new profile starts with.
    pub fn starter() -> Self {
        Self {
            name: "Default".to_string(),
            primary_weapon_id: "ak47".to_string(),
            secondary_weapon_id: "python".to_string(),
            primary_attachments: BTreeMap::new(),
            secondary_attachments: BTreeMap::new(),
            skin_assignments: BTreeMap::new(),
            armor_head: None,
            armor_chest: None,
            armor_legs: None,
            armor_hands: None,
            armor_feet: None,
        }
    }

    pub fn weapon(&self, slot: WeaponSlot) -> &str {
        match slot {
            WeaponSlot::Primary => &self.primary_weapon_id,
            WeaponSlot::Secondary => &self.secondary_weapon_id,
        }
    }

    pub fn set_weapon(&mut self, slot: WeaponSlot, weapon_id: impl Into<String>) {
        match slot {
            WeaponSlot::Primary => self.primary_weapon_id = weapon_id.into(),
            WeaponSlot::Secondary => self.secondary_weapon_id = weapon_id.into(),
        }
    }

    pub fn attachments(&self, slot: WeaponSlot) -> &BTreeMap<String, String> {
        match slot {
            WeaponSlot::Primary => &self.primary_attachments,
            WeaponSlot::Secondary => &self.secondary_attachments,
        }
    }

    pub fn attachments_mut(&mut self, slot: WeaponSlot) -> &mut BTreeMap<String, String> {
        match slot {
            WeaponSlot::Primary => &mut self.primary_attachments,
            WeaponSlot::Secondary => &mut self.secondary_attachments,
        }
    }

    /// Skin assigned to a weapon, falling back to the implicit default.
    pub fn skin_for(&self, weapon_id: &str) -> &str {
        self.skin_assignments
            .get(weapon_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SKIN_ID)
    }

    pub fn armor(&self, slot: ArmorSlot) -> Option<&str> {
        let piece = match slot {
            ArmorSlot::Head => &self.armor_head,
            ArmorSlot::Chest => &self.armor_chest,
            ArmorSlot::Legs => &self.armor_legs,
            ArmorSlot::Hands => &self.armor_hands,
            ArmorSlot::Feet => &self.armor_feet,
        };
        piece.as_deref()
    }

    pub fn set_armor(&mut self, slot: ArmorSlot, armor_id: Option<String>) {
        let piece = match slot {
            ArmorSlot::Head => &mut self.armor_head,
            ArmorSlot::Chest => &mut self.armor_chest,
            ArmorSlot::Legs => &mut self.armor_legs,
            ArmorSlot::Hands => &mut self.armor_hands,
            ArmorSlot::Feet => &mut self.armor_feet,
        };
        *piece = armor_id;
    }
}

fn default_loadouts() -> Vec<Loadout> {
    vec![Loadout::starter()]
}

/// Persistent per-player record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub identity: PlayerId,
    pub token_balance: u64,
    #[serde(default)]
    pub owned_weapons: BTreeSet<String>,
    #[serde(default)]
    pub owned_skins: BTreeSet<String>,
    #[serde(default)]
    pub owned_armor: BTreeSet<String>,
    #[serde(default = "default_loadouts")]
    pub loadouts: Vec<Loadout>,
    #[serde(default)]
    pub total_kills: u64,
    #[serde(default)]
    pub total_deaths: u64,
    #[serde(default)]
    pub matches_played: u64,
    /// Epoch until the first admin refill.
    #[serde(default)]
    pub last_daily_refill: DateTime<Utc>,
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
}

impl PlayerProfile {
    /// Fresh profile: starting balance, nothing owned, one starter loadout.
    pub fn new(identity: PlayerId, starting_tokens: u64) -> Self {
        Self {
            identity,
            token_balance: starting_tokens,
            owned_weapons: BTreeSet::new(),
            owned_skins: BTreeSet::new(),
            owned_armor: BTreeSet::new(),
            loadouts: default_loadouts(),
            total_kills: 0,
            total_deaths: 0,
            matches_played: 0,
            last_daily_refill: DateTime::<Utc>::default(),
            last_updated: Utc::now(),
        }
    }

    pub fn active_loadout(&self) -> Option<&Loadout> {
        self.loadouts.first()
    }

    /// Active loadout, recreating the starter if a stored record had none.
    pub fn active_loadout_mut(&mut self) -> &mut Loadout {
        if self.loadouts.is_empty() {
            self.loadouts.push(Loadout::starter());
        }
        &mut self.loadouts[0]
    }

    /// Ownership check; the default skin is owned by everyone.
    pub fn owns(&self, kind: ItemKind, item_id: &str) -> bool {
        match kind {
            ItemKind::Skin if item_id == DEFAULT_SKIN_ID => true,
            _ => self.owned(kind).contains(item_id),
        }
    }

    pub fn owned(&self, kind: ItemKind) -> &BTreeSet<String> {
        match kind {
            ItemKind::Weapon => &self.owned_weapons,
            ItemKind::Skin => &self.owned_skins,
            ItemKind::Armor => &self.owned_armor,
        }
    }

    pub fn owned_mut(&mut self, kind: ItemKind) -> &mut BTreeSet<String> {
        match kind {
            ItemKind::Weapon => &mut self.owned_weapons,
            ItemKind::Skin => &mut self.owned_skins,
            ItemKind::Armor => &mut self.owned_armor,
        }
    }
}
