//! # Economy Engine
//!
//! Wallet and ownership rules applied to a single [`PlayerProfile`].
//!
//! Every operation validates first and mutates last, so a returned error
//! means the profile is exactly as it was before the call. Balances are
//! unsigned; amounts arriving from callers are signed so a negative request
//! can be rejected as [`EconomyError::InvalidAmount`] instead of wrapping.
//!
//! ```rust
//! use arena_economy::catalog::{Catalog, ItemKind};
//! use arena_economy::economy::{purchase_item, EconomyError};
//! use arena_economy::profile::{PlayerId, PlayerProfile};
//!
//! let catalog = Catalog::builtin();
//! let mut profile = PlayerProfile::new(PlayerId(1), 500);
//! let receipt = purchase_item(&mut profile, &catalog, ItemKind::Weapon, "ak47").unwrap();
//! assert_eq!(receipt.balance_after, 0);
//! assert!(matches!(
//!     purchase_item(&mut profile, &catalog, ItemKind::Weapon, "ak47"),
//!     Err(EconomyError::AlreadyOwned { .. })
//! ));
//! ```

pub mod wager;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{ArmorSlot, Catalog, ItemKind};
use crate::metrics;
use crate::profile::{PlayerProfile, WeaponSlot};

pub use wager::{play_wager_round, DiceRoller, RngDice, ThreadDice, WagerOutcome, WagerRound, WagerRules};

/// Recoverable validation failures. None of these change the profile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("{kind} '{id}' is already owned")]
    AlreadyOwned { kind: ItemKind, id: String },
    #[error("{kind} '{id}' is not in the catalog")]
    ItemNotFound { kind: ItemKind, id: String },
    #[error("{kind} '{id}' is not owned")]
    NotOwned { kind: ItemKind, id: String },
    #[error("bet {bet} is outside {min}-{max}")]
    InvalidBetRange { bet: i64, min: u64, max: u64 },
    #[error("wager cooldown active, {remaining_secs}s remaining")]
    CooldownActive { remaining_secs: i64 },
    #[error("invalid amount {0}")]
    InvalidAmount(i64),
    #[error("no {slot} slot on {target}")]
    InvalidSlot { target: String, slot: String },
}

/// Step direction for selection cycling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

impl Direction {
    fn step(self) -> isize {
        match self {
            Direction::Next => 1,
            Direction::Previous => -1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Next => write!(f, "next"),
            Direction::Previous => write!(f, "prev"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "next" | "+1" | "1" | "right" => Ok(Direction::Next),
            "prev" | "previous" | "-1" | "left" => Ok(Direction::Previous),
            other => Err(format!("unknown direction '{}'", other)),
        }
    }
}

/// Receipt for a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub kind: ItemKind,
    pub item_id: String,
    pub price: u64,
    pub balance_after: u64,
}

fn non_negative(amount: i64) -> Result<u64, EconomyError> {
    u64::try_from(amount).map_err(|_| EconomyError::InvalidAmount(amount))
}

/// Credit tokens. Returns the new balance.
pub fn award(profile: &mut PlayerProfile, amount: i64) -> Result<u64, EconomyError> {
    let amount = non_negative(amount)?;
    profile.token_balance = profile.token_balance.saturating_add(amount);
    metrics::record_tokens_awarded(amount);
    Ok(profile.token_balance)
}

/// Debit tokens if the balance covers it. Returns the new balance.
pub fn spend(profile: &mut PlayerProfile, amount: i64) -> Result<u64, EconomyError> {
    let amount = non_negative(amount)?;
    if profile.token_balance < amount {
        return Err(EconomyError::InsufficientFunds {
            needed: amount,
            available: profile.token_balance,
        });
    }
    profile.token_balance -= amount;
    Ok(profile.token_balance)
}

/// Buy a catalog item at its effective price.
pub fn purchase_item(
    profile: &mut PlayerProfile,
    catalog: &Catalog,
    kind: ItemKind,
    item_id: &str,
) -> Result<Purchase, EconomyError> {
    let item = catalog
        .get(kind, item_id)
        .ok_or_else(|| EconomyError::ItemNotFound {
            kind,
            id: item_id.to_string(),
        })?;
    if profile.owns(kind, item_id) {
        return Err(EconomyError::AlreadyOwned {
            kind,
            id: item_id.to_string(),
        });
    }
    let price = catalog.price_of(item);
    if profile.token_balance < price {
        return Err(EconomyError::InsufficientFunds {
            needed: price,
            available: profile.token_balance,
        });
    }

    profile.token_balance -= price;
    profile.owned_mut(kind).insert(item_id.to_string());
    metrics::record_purchase(price);
    debug!(
        "Player {} bought {} '{}' for {} ({} left)",
        profile.identity, kind, item_id, price, profile.token_balance
    );
    Ok(Purchase {
        kind,
        item_id: item_id.to_string(),
        price,
        balance_after: profile.token_balance,
    })
}

/// Assign an owned skin to a weapon in the active loadout.
///
/// Only ownership is checked; equipped ids are not cleared if the catalog or
/// ownership later changes.
pub fn equip_weapon_skin(
    profile: &mut PlayerProfile,
    weapon_id: &str,
    skin_id: &str,
) -> Result<(), EconomyError> {
    if !profile.owns(ItemKind::Skin, skin_id) {
        return Err(EconomyError::NotOwned {
            kind: ItemKind::Skin,
            id: skin_id.to_string(),
        });
    }
    profile
        .active_loadout_mut()
        .skin_assignments
        .insert(weapon_id.to_string(), skin_id.to_string());
    Ok(())
}

/// Fit an attachment to the weapon in `slot`. Attachments are free and
/// need no ownership; the attachment must exist and fit `attachment_slot`.
pub fn equip_attachment(
    profile: &mut PlayerProfile,
    catalog: &Catalog,
    slot: WeaponSlot,
    attachment_slot: &str,
    attachment_id: &str,
) -> Result<(), EconomyError> {
    let attachment = catalog
        .attachment(attachment_id)
        .ok_or_else(|| EconomyError::InvalidSlot {
            target: format!("attachment '{}'", attachment_id),
            slot: attachment_slot.to_string(),
        })?;
    if !attachment.slot.eq_ignore_ascii_case(attachment_slot) {
        return Err(EconomyError::InvalidSlot {
            target: format!("attachment '{}'", attachment_id),
            slot: attachment_slot.to_string(),
        });
    }
    profile
        .active_loadout_mut()
        .attachments_mut(slot)
        .insert(attachment.slot.clone(), attachment.id.clone());
    Ok(())
}

fn step_index(current: usize, len: usize, direction: Direction) -> usize {
    (current as isize + direction.step()).rem_euclid(len as isize) as usize
}

/// Move the weapon in `slot` one step through the catalog's weapon list,
/// wrapping at either end. Ownership is not required.
pub fn cycle_weapon_selection(
    profile: &mut PlayerProfile,
    catalog: &Catalog,
    slot: WeaponSlot,
    direction: Direction,
) -> Result<String, EconomyError> {
    let ids = catalog.all_ids(ItemKind::Weapon);
    if ids.is_empty() {
        return Err(EconomyError::ItemNotFound {
            kind: ItemKind::Weapon,
            id: String::new(),
        });
    }
    let loadout = profile.active_loadout_mut();
    let current = ids
        .iter()
        .position(|id| *id == loadout.weapon(slot))
        .unwrap_or(0);
    let next = ids[step_index(current, ids.len(), direction)].to_string();
    loadout.set_weapon(slot, next.clone());
    Ok(next)
}

/// Move the armor in `slot` one step through the owned pieces for that
/// slot, in catalog order. An empty slot starts from the first piece.
pub fn cycle_armor(
    profile: &mut PlayerProfile,
    catalog: &Catalog,
    slot: ArmorSlot,
    direction: Direction,
) -> Result<String, EconomyError> {
    let owned: Vec<&str> = catalog
        .armor_for_slot(slot)
        .filter(|a| profile.owns(ItemKind::Armor, &a.id))
        .map(|a| a.id.as_str())
        .collect();
    if owned.is_empty() {
        return Err(EconomyError::NotOwned {
            kind: ItemKind::Armor,
            id: format!("any {} armor", slot),
        });
    }
    let next = match profile
        .active_loadout()
        .and_then(|l| l.armor(slot))
        .and_then(|cur| owned.iter().position(|id| *id == cur))
    {
        Some(current) => owned[step_index(current, owned.len(), direction)].to_string(),
        None => owned[0].to_string(),
    };
    profile
        .active_loadout_mut()
        .set_armor(slot, Some(next.clone()));
    Ok(next)
}

/// Add a skin without charging. Returns `false` if it was already owned.
pub fn grant_skin(profile: &mut PlayerProfile, skin_id: &str) -> bool {
    profile.owned_skins.insert(skin_id.to_string())
}

/// Credit a kill: bump the counter and pay the reward.
pub fn record_kill(profile: &mut PlayerProfile, reward: u64) -> u64 {
    profile.total_kills = profile.total_kills.saturating_add(1);
    profile.token_balance = profile.token_balance.saturating_add(reward);
    metrics::inc_kill();
    metrics::record_tokens_awarded(reward);
    profile.token_balance
}

pub fn record_death(profile: &mut PlayerProfile) {
    profile.total_deaths = profile.total_deaths.saturating_add(1);
}

pub fn record_match_played(profile: &mut PlayerProfile) {
    profile.matches_played = profile.matches_played.saturating_add(1);
}

/// Reset an admin's balance to `amount` once per 24 hours.
/// Returns whether the refill was applied.
pub fn apply_admin_daily_refill(
    profile: &mut PlayerProfile,
    amount: u64,
    now: DateTime<Utc>,
) -> bool {
    if now.signed_duration_since(profile.last_daily_refill) < Duration::hours(24) {
        return false;
    }
    profile.token_balance = amount;
    profile.last_daily_refill = now;
    true
}
