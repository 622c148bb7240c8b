//! # Command Surface
//!
//! Text commands from the dispatcher are parsed into [`Command`] values and
//! run by [`CommandProcessor`]. Every mutating command passes the rate
//! limiter first, then runs against the caller's session under its lock and
//! saves the profile when it succeeds. Read-only commands skip the limiter
//! and never load a profile as a side effect.
//!
//! ```text
//! purchase-weapon <weapon>
//! purchase-skin <weapon> <skin>
//! purchase-armor <armor> [quoted-cost]
//! equip-skin <primary|secondary> <skin>
//! equip-attachment <primary|secondary> <attachment-slot> <attachment>
//! cycle-weapon <primary|secondary> <next|prev>
//! cycle-armor <head|chest|legs|hands|feet> <next|prev>
//! wager <bet>
//! admin-grant-skin <player> <skin>
//! admin-reset-profile <player>
//! balance
//! stats
//! ```

use chrono::Utc;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::catalog::{ArmorSlot, Catalog, CatalogHandle, ItemKind};
use crate::config::{Config, GameConfig};
use crate::economy::{self, DiceRoller, Direction, EconomyError, Purchase, ThreadDice, WagerRound, WagerRules};
use crate::logutil::escape_log;
use crate::metrics;
use crate::profile::{PlayerId, PlayerProfile, WeaponSlot};
use crate::ratelimit::RateLimiter;
use crate::session::{SaveSweep, Session, SessionRegistry};
use crate::storage::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PurchaseWeapon {
        weapon_id: String,
    },
    PurchaseSkin {
        weapon_id: String,
        skin_id: String,
    },
    /// The quoted cost from the client is accepted and ignored; the catalog
    /// price is charged.
    PurchaseArmor {
        armor_id: String,
        quoted_cost: Option<u64>,
    },
    EquipSkin {
        slot: WeaponSlot,
        skin_id: String,
    },
    EquipAttachment {
        slot: WeaponSlot,
        attachment_slot: String,
        attachment_id: String,
    },
    CycleWeapon {
        slot: WeaponSlot,
        direction: Direction,
    },
    CycleArmor {
        slot: ArmorSlot,
        direction: Direction,
    },
    Wager {
        bet: i64,
    },
    AdminGrantSkin {
        target: PlayerId,
        skin_id: String,
    },
    AdminResetProfile {
        target: PlayerId,
    },
    Balance,
    Stats,
}

fn arg<'a>(parts: &[&'a str], idx: usize, usage: &str) -> Result<&'a str, CommandError> {
    parts
        .get(idx)
        .copied()
        .ok_or_else(|| CommandError::Usage(usage.to_string()))
}

fn parse_arg<T: FromStr>(parts: &[&str], idx: usize, usage: &str) -> Result<T, CommandError> {
    arg(parts, idx, usage)?
        .parse()
        .map_err(|_| CommandError::Usage(usage.to_string()))
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(verb) = parts.first() else {
            return Err(CommandError::Usage("empty command".to_string()));
        };
        let verb = verb.to_ascii_lowercase();
        let command = match verb.as_str() {
            "purchase-weapon" => {
                let usage = "purchase-weapon <weapon>";
                Command::PurchaseWeapon {
                    weapon_id: arg(&parts, 1, usage)?.to_string(),
                }
            }
            "purchase-skin" => {
                let usage = "purchase-skin <weapon> <skin>";
                Command::PurchaseSkin {
                    weapon_id: arg(&parts, 1, usage)?.to_string(),
                    skin_id: arg(&parts, 2, usage)?.to_string(),
                }
            }
            "purchase-armor" => {
                let usage = "purchase-armor <armor> [cost]";
                Command::PurchaseArmor {
                    armor_id: arg(&parts, 1, usage)?.to_string(),
                    quoted_cost: match parts.get(2) {
                        Some(_) => Some(parse_arg(&parts, 2, usage)?),
                        None => None,
                    },
                }
            }
            "equip-skin" => {
                let usage = "equip-skin <primary|secondary> <skin>";
                Command::EquipSkin {
                    slot: parse_arg(&parts, 1, usage)?,
                    skin_id: arg(&parts, 2, usage)?.to_string(),
                }
            }
            "equip-attachment" => {
                let usage = "equip-attachment <primary|secondary> <slot> <attachment>";
                Command::EquipAttachment {
                    slot: parse_arg(&parts, 1, usage)?,
                    attachment_slot: arg(&parts, 2, usage)?.to_ascii_lowercase(),
                    attachment_id: arg(&parts, 3, usage)?.to_string(),
                }
            }
            "cycle-weapon" => {
                let usage = "cycle-weapon <primary|secondary> <next|prev>";
                Command::CycleWeapon {
                    slot: parse_arg(&parts, 1, usage)?,
                    direction: parse_arg(&parts, 2, usage)?,
                }
            }
            "cycle-armor" => {
                let usage = "cycle-armor <head|chest|legs|hands|feet> <next|prev>";
                Command::CycleArmor {
                    slot: parse_arg(&parts, 1, usage)?,
                    direction: parse_arg(&parts, 2, usage)?,
                }
            }
            "wager" | "play-wager" => Command::Wager {
                bet: parse_arg(&parts, 1, "wager <bet>")?,
            },
            "admin-grant-skin" => {
                let usage = "admin-grant-skin <player> <skin>";
                Command::AdminGrantSkin {
                    target: parse_arg(&parts, 1, usage)?,
                    skin_id: arg(&parts, 2, usage)?.to_string(),
                }
            }
            "admin-reset-profile" => Command::AdminResetProfile {
                target: parse_arg(&parts, 1, "admin-reset-profile <player>")?,
            },
            "balance" => Command::Balance,
            "stats" => Command::Stats,
            other => return Err(CommandError::Usage(format!("unknown command '{}'", other))),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::PurchaseWeapon { .. } => "purchase-weapon",
            Command::PurchaseSkin { .. } => "purchase-skin",
            Command::PurchaseArmor { .. } => "purchase-armor",
            Command::EquipSkin { .. } => "equip-skin",
            Command::EquipAttachment { .. } => "equip-attachment",
            Command::CycleWeapon { .. } => "cycle-weapon",
            Command::CycleArmor { .. } => "cycle-armor",
            Command::Wager { .. } => "wager",
            Command::AdminGrantSkin { .. } => "admin-grant-skin",
            Command::AdminResetProfile { .. } => "admin-reset-profile",
            Command::Balance => "balance",
            Command::Stats => "stats",
        }
    }

    /// Commands that change state and therefore pass the rate limiter.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Balance | Command::Stats)
    }

    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Command::AdminGrantSkin { .. } | Command::AdminResetProfile { .. }
        )
    }
}

/// Read-only view of a profile for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStats {
    pub tokens: u64,
    pub kills: u64,
    pub deaths: u64,
    pub matches_played: u64,
    pub owned_weapons: usize,
    pub owned_skins: usize,
    pub owned_armor: usize,
}

impl From<&PlayerProfile> for ProfileStats {
    fn from(profile: &PlayerProfile) -> Self {
        Self {
            tokens: profile.token_balance,
            kills: profile.total_kills,
            deaths: profile.total_deaths,
            matches_played: profile.matches_played,
            owned_weapons: profile.owned_weapons.len(),
            owned_skins: profile.owned_skins.len(),
            owned_armor: profile.owned_armor.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Purchased(Purchase),
    SkinEquipped {
        weapon_id: String,
        skin_id: String,
    },
    AttachmentEquipped {
        slot: WeaponSlot,
        attachment_slot: String,
        attachment_id: String,
    },
    WeaponSelected {
        slot: WeaponSlot,
        weapon_id: String,
    },
    ArmorSelected {
        slot: ArmorSlot,
        armor_id: String,
    },
    Wager(WagerRound),
    SkinGranted {
        target: PlayerId,
        skin_id: String,
        newly_added: bool,
    },
    ProfileReset {
        target: PlayerId,
    },
    Balance {
        tokens: u64,
    },
    Stats(ProfileStats),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] EconomyError),
    #[error("slow down")]
    Throttled,
    #[error("permission denied: {0} requires admin")]
    PermissionDenied(&'static str),
    #[error("player {0} is not online")]
    PlayerOffline(PlayerId),
    #[error("usage: {0}")]
    Usage(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Runs commands and game hooks against the session registry.
pub struct CommandProcessor {
    catalog: CatalogHandle,
    sessions: Arc<SessionRegistry>,
    limiter: Arc<RateLimiter>,
    rules: WagerRules,
    game: GameConfig,
    admins: HashSet<PlayerId>,
}

impl CommandProcessor {
    pub fn new(
        config: &Config,
        catalog: CatalogHandle,
        sessions: Arc<SessionRegistry>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            catalog,
            sessions,
            limiter,
            rules: WagerRules::from(&config.wager),
            game: config.game.clone(),
            admins: config.admins.iter().copied().collect(),
        }
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn is_admin(&self, identity: PlayerId) -> bool {
        self.admins.contains(&identity)
    }

    pub fn execute(&self, actor: PlayerId, command: Command) -> Result<CommandOutcome, CommandError> {
        self.execute_with_dice(actor, command, &mut ThreadDice)
    }

    pub fn execute_with_dice(
        &self,
        actor: PlayerId,
        command: Command,
        dice: &mut dyn DiceRoller,
    ) -> Result<CommandOutcome, CommandError> {
        let name = command.name();
        if command.is_mutating() && !self.limiter.allow(actor) {
            metrics::inc_throttled();
            metrics::record_command(name, false);
            return Err(CommandError::Throttled);
        }
        let result = self.dispatch(actor, command, dice);
        metrics::record_command(name, result.is_ok());
        if let Err(e) = &result {
            debug!("Player {} {} rejected: {}", actor, name, e);
        }
        result
    }

    fn dispatch(
        &self,
        actor: PlayerId,
        command: Command,
        dice: &mut dyn DiceRoller,
    ) -> Result<CommandOutcome, CommandError> {
        match command {
            Command::Balance => self.resident(actor, |session| CommandOutcome::Balance {
                tokens: session.profile.token_balance,
            }),
            Command::Stats => self.resident(actor, |session| {
                CommandOutcome::Stats(ProfileStats::from(&session.profile))
            }),
            Command::AdminGrantSkin { target, skin_id } => {
                self.require_admin(actor, "admin-grant-skin")?;
                if self.catalog.snapshot().skin(&skin_id).is_none() {
                    debug!("Granting skin {} not in the current catalog", escape_log(&skin_id));
                }
                let newly_added = self.resident(target, |session| {
                    let added = economy::grant_skin(&mut session.profile, &skin_id);
                    if added {
                        self.persist(session);
                    }
                    added
                })?;
                info!(target: "security", "Admin {} granted skin {} to {}", actor, skin_id, target);
                Ok(CommandOutcome::SkinGranted {
                    target,
                    skin_id,
                    newly_added,
                })
            }
            Command::AdminResetProfile { target } => {
                self.require_admin(actor, "admin-reset-profile")?;
                self.sessions.reset_profile(target)?;
                info!(target: "security", "Admin {} reset profile of {}", actor, target);
                Ok(CommandOutcome::ProfileReset { target })
            }
            player_command => {
                let catalog = self.catalog.snapshot();
                self.sessions.with_session(actor, |session| -> Result<CommandOutcome, CommandError> {
                    session.touch();
                    let outcome = self.apply(session, &catalog, player_command, dice)?;
                    self.persist(session);
                    Ok(outcome)
                })
            }
        }
    }

    fn apply(
        &self,
        session: &mut Session,
        catalog: &Catalog,
        command: Command,
        dice: &mut dyn DiceRoller,
    ) -> Result<CommandOutcome, CommandError> {
        let profile = &mut session.profile;
        let outcome = match command {
            Command::PurchaseWeapon { weapon_id } => CommandOutcome::Purchased(
                economy::purchase_item(profile, catalog, ItemKind::Weapon, &weapon_id)?,
            ),
            Command::PurchaseSkin { weapon_id, skin_id } => {
                if catalog.weapon(&weapon_id).is_none() {
                    return Err(EconomyError::ItemNotFound {
                        kind: ItemKind::Weapon,
                        id: weapon_id,
                    }
                    .into());
                }
                if !catalog.weapon_offers_skin(&weapon_id, &skin_id) {
                    return Err(EconomyError::ItemNotFound {
                        kind: ItemKind::Skin,
                        id: skin_id,
                    }
                    .into());
                }
                if profile.owns(ItemKind::Skin, &skin_id) {
                    return Err(EconomyError::AlreadyOwned {
                        kind: ItemKind::Skin,
                        id: skin_id,
                    }
                    .into());
                }
                if !profile.owns(ItemKind::Weapon, &weapon_id) {
                    return Err(EconomyError::NotOwned {
                        kind: ItemKind::Weapon,
                        id: weapon_id,
                    }
                    .into());
                }
                CommandOutcome::Purchased(economy::purchase_item(
                    profile,
                    catalog,
                    ItemKind::Skin,
                    &skin_id,
                )?)
            }
            Command::PurchaseArmor {
                armor_id,
                quoted_cost,
            } => {
                let receipt = economy::purchase_item(profile, catalog, ItemKind::Armor, &armor_id)?;
                if let Some(quoted) = quoted_cost.filter(|q| *q != receipt.price) {
                    debug!(
                        "Armor {} quoted at {} but charged catalog price {}",
                        armor_id, quoted, receipt.price
                    );
                }
                CommandOutcome::Purchased(receipt)
            }
            Command::EquipSkin { slot, skin_id } => {
                let weapon_id = profile
                    .active_loadout()
                    .map(|l| l.weapon(slot).to_string())
                    .unwrap_or_default();
                economy::equip_weapon_skin(profile, &weapon_id, &skin_id)?;
                CommandOutcome::SkinEquipped { weapon_id, skin_id }
            }
            Command::EquipAttachment {
                slot,
                attachment_slot,
                attachment_id,
            } => {
                economy::equip_attachment(profile, catalog, slot, &attachment_slot, &attachment_id)?;
                CommandOutcome::AttachmentEquipped {
                    slot,
                    attachment_slot,
                    attachment_id,
                }
            }
            Command::CycleWeapon { slot, direction } => CommandOutcome::WeaponSelected {
                slot,
                weapon_id: economy::cycle_weapon_selection(profile, catalog, slot, direction)?,
            },
            Command::CycleArmor { slot, direction } => CommandOutcome::ArmorSelected {
                slot,
                armor_id: economy::cycle_armor(profile, catalog, slot, direction)?,
            },
            Command::Wager { bet } => CommandOutcome::Wager(economy::play_wager_round(
                profile,
                &mut session.last_wager_at,
                bet,
                &self.rules,
                Utc::now(),
                dice,
            )?),
            Command::Balance
            | Command::Stats
            | Command::AdminGrantSkin { .. }
            | Command::AdminResetProfile { .. } => {
                return Err(CommandError::Usage("not a player command".to_string()))
            }
        };
        Ok(outcome)
    }

    fn resident<R>(
        &self,
        identity: PlayerId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<R, CommandError> {
        self.sessions
            .with_resident(identity, f)
            .ok_or(CommandError::PlayerOffline(identity))
    }

    fn require_admin(&self, actor: PlayerId, command: &'static str) -> Result<(), CommandError> {
        if self.is_admin(actor) {
            return Ok(());
        }
        warn!(target: "security", "Player {} attempted {} without admin rights", actor, command);
        Err(CommandError::PermissionDenied(command))
    }

    /// Save after a successful mutation. Failures are logged; the in-memory
    /// profile stays authoritative until the next save succeeds.
    fn persist(&self, session: &mut Session) {
        let _ = self.sessions.save_session(session);
    }

    /// Player joined: load the profile and apply the admin daily refill.
    pub fn connect(&self, identity: PlayerId) {
        let refill = self.game.daily_refill_enabled && self.is_admin(identity);
        self.sessions.with_session(identity, |session| {
            if refill
                && economy::apply_admin_daily_refill(
                    &mut session.profile,
                    self.game.admin_daily_tokens,
                    Utc::now(),
                )
            {
                info!(
                    "Admin {} daily refill: balance set to {}",
                    identity, self.game.admin_daily_tokens
                );
                self.persist(session);
            }
        });
    }

    /// Player left: final save and eviction.
    pub fn disconnect(&self, identity: PlayerId) -> bool {
        match self.sessions.remove(identity) {
            Some(Ok(())) => true,
            Some(Err(e)) => {
                warn!("Final save for {} failed: {}", identity, e);
                true
            }
            None => false,
        }
    }

    /// Kill reward and counters. Either side may be offline; offline players
    /// are skipped.
    pub fn on_kill(&self, attacker: PlayerId, victim: PlayerId) {
        if attacker != victim {
            self.sessions.with_resident(attacker, |session| {
                let balance = economy::record_kill(&mut session.profile, self.game.tokens_per_kill);
                debug!("Player {} kill reward, balance {}", attacker, balance);
                self.persist(session);
            });
        }
        self.sessions.with_resident(victim, |session| {
            economy::record_death(&mut session.profile);
            self.persist(session);
        });
    }

    pub fn on_match_played(&self, identity: PlayerId) {
        self.sessions.with_resident(identity, |session| {
            economy::record_match_played(&mut session.profile);
            self.persist(session);
        });
    }

    pub fn autosave(&self) -> SaveSweep {
        self.sessions.save_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("purchase-weapon ak47").unwrap(),
            Command::PurchaseWeapon {
                weapon_id: "ak47".to_string()
            }
        );
        assert_eq!(
            Command::parse("PURCHASE-ARMOR metal.facemask 999").unwrap(),
            Command::PurchaseArmor {
                armor_id: "metal.facemask".to_string(),
                quoted_cost: Some(999)
            }
        );
        assert_eq!(
            Command::parse("cycle-armor chest prev").unwrap(),
            Command::CycleArmor {
                slot: ArmorSlot::Chest,
                direction: Direction::Previous
            }
        );
        assert_eq!(Command::parse("wager -5").unwrap(), Command::Wager { bet: -5 });
        assert_eq!(Command::parse("  stats ").unwrap(), Command::Stats);
    }

    #[test]
    fn test_parse_errors_are_usage() {
        for line in [
            "",
            "dance",
            "purchase-skin ak47",
            "equip-skin tertiary 0",
            "wager lots",
            "admin-reset-profile bob",
            "purchase-armor metal.facemask cheap",
        ] {
            assert!(
                matches!(Command::parse(line), Err(CommandError::Usage(_))),
                "{:?}",
                line
            );
        }
    }

    #[test]
    fn test_read_commands_skip_limiter() {
        assert!(!Command::Balance.is_mutating());
        assert!(!Command::Stats.is_mutating());
        assert!(Command::Wager { bet: 10 }.is_mutating());
        assert!(Command::AdminResetProfile { target: PlayerId(1) }.is_admin());
    }
}
