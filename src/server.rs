//! Console front end for the arena economy.
//!
//! Reads one event or command per line from stdin and prints one reply line:
//!
//! ```text
//! connect <player>
//! disconnect <player>
//! kill <attacker> <victim>
//! match <player>
//! reload-catalog
//! save-all
//! <player> <command...>      e.g. "76561198000000001 purchase-weapon ak47"
//! ```
//!
//! Sessions are autosaved on a timer and saved once more on shutdown.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::catalog::{CatalogHandle, DEFAULT_SKIN_ID};
use crate::commands::{Command, CommandError, CommandOutcome, CommandProcessor};
use crate::config::Config;
use crate::economy::WagerOutcome;
use crate::logutil::escape_log;
use crate::metrics;
use crate::profile::PlayerId;
use crate::ratelimit::RateLimiter;
use crate::session::SessionRegistry;
use crate::storage::ProfileStore;

pub struct GameServer {
    config: Config,
    catalog_dir: PathBuf,
    processor: CommandProcessor,
    limiter: Arc<RateLimiter>,
}

impl GameServer {
    /// Open the profile store and load the catalog. Missing catalog documents
    /// are created; broken ones fall back to built-in data.
    pub async fn new(config: Config) -> Result<Self> {
        let catalog_dir = config.storage.catalog_dir();
        let store = ProfileStore::open(config.storage.profiles_dir(), config.game.starting_tokens)
            .map_err(|e| anyhow!("Failed to open profile store: {}", e))?;
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let mut sessions = SessionRegistry::new(Arc::new(store));
        if config.rate_limit.evict_on_disconnect {
            sessions = sessions.with_rate_limiter(Arc::clone(&limiter));
        }

        let dir = catalog_dir.clone();
        let (catalog, report) =
            tokio::task::spawn_blocking(move || crate::catalog::loader::load_or_default(&dir))
                .await?;
        if !report.fully_from_disk() {
            info!("Catalog sources: weapons {:?}, armor {:?}", report.weapons, report.armor);
        }

        let processor = CommandProcessor::new(
            &config,
            CatalogHandle::new(catalog),
            Arc::new(sessions),
            Arc::clone(&limiter),
        );
        Ok(Self {
            config,
            catalog_dir,
            processor,
            limiter,
        })
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    /// Handle one console line and produce the reply.
    pub fn handle_line(&self, line: &str) -> String {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let rest = parts.next().unwrap_or_default().trim();

        match head.to_ascii_lowercase().as_str() {
            "" => String::new(),
            "connect" => match rest.parse::<PlayerId>() {
                Ok(id) => {
                    self.processor.connect(id);
                    info!("Player {} connected", id);
                    format!("{} connected", id)
                }
                Err(e) => e,
            },
            "disconnect" => match rest.parse::<PlayerId>() {
                Ok(id) if self.processor.disconnect(id) => {
                    info!("Player {} disconnected", id);
                    format!("{} disconnected", id)
                }
                Ok(id) => format!("{} was not connected", id),
                Err(e) => e,
            },
            "kill" => {
                let ids: Vec<Result<PlayerId, String>> =
                    rest.split_whitespace().map(|s| s.parse::<PlayerId>()).collect();
                match ids.as_slice() {
                    [Ok(attacker), Ok(victim)] => {
                        self.processor.on_kill(*attacker, *victim);
                        format!("{} killed {}", attacker, victim)
                    }
                    _ => "usage: kill <attacker> <victim>".to_string(),
                }
            }
            "match" => match rest.parse::<PlayerId>() {
                Ok(id) => {
                    self.processor.on_match_played(id);
                    format!("match recorded for {}", id)
                }
                Err(e) => e,
            },
            "reload-catalog" => {
                let report = self.processor.catalog().reload(&self.catalog_dir);
                let summary = self.processor.catalog().snapshot().summary();
                format!(
                    "catalog reloaded: {} weapons, {} skins, {} armor ({:?}/{:?})",
                    summary.weapons, summary.skins, summary.armor, report.weapons, report.armor
                )
            }
            "save-all" => {
                let sweep = self.processor.autosave();
                format!("saved {}, failed {}", sweep.saved, sweep.failed.len())
            }
            _ => match head.parse::<PlayerId>() {
                Ok(actor) => {
                    debug!("{} -> {}", actor, escape_log(rest));
                    let reply = Command::parse(rest)
                        .and_then(|command| self.processor.execute(actor, command));
                    render_reply(reply)
                }
                Err(_) => format!("unknown input '{}'", escape_log(head)),
            },
        }
    }

    pub async fn run(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut autosave = tokio::time::interval(self.config.game.autosave_interval());
        autosave.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        autosave.tick().await;

        info!("Arena economy ready; reading commands from stdin");
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let reply = self.handle_line(&line);
                            if !reply.is_empty() {
                                println!("{}", reply);
                            }
                        }
                        Ok(None) => {
                            info!("Input closed");
                            break;
                        }
                        Err(e) => {
                            warn!("Failed reading input: {}", e);
                            break;
                        }
                    }
                }
                _ = autosave.tick() => {
                    let sweep = self.processor.autosave();
                    debug!("Autosave: {} saved, {} failed", sweep.saved, sweep.failed.len());
                    debug!("Counters: {:?}", metrics::snapshot());
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Save and close every session.
    pub fn shutdown(&self) {
        info!("Shutting down arena economy...");
        let sweep = self.processor.sessions().close_all();
        if !sweep.failed.is_empty() {
            warn!("{} profiles could not be saved on shutdown", sweep.failed.len());
        }
    }

    pub async fn show_status(&self) -> Result<()> {
        let catalog = self.processor.catalog().snapshot();
        let summary = catalog.summary();
        let stats = self.limiter.stats();
        let counters = metrics::snapshot();
        println!("=== Arena Economy Status ===");
        println!("Data directory: {}", self.config.storage.data_dir);
        println!("Stored profiles: {}", self.processor.sessions().store().count_profiles());
        println!("Active sessions: {}", self.processor.sessions().active_count());
        println!(
            "Catalog: {} weapons, {} skins, {} armor, {} attachments",
            summary.weapons, summary.skins, summary.armor, summary.attachments
        );
        println!(
            "Rate limit: {} actions / {}ms ({} players tracked)",
            stats.max_actions,
            stats.window.as_millis(),
            stats.tracked_players
        );
        println!(
            "Purchases: {} ({} tokens), wagers W/L/T: {}/{}/{}",
            counters.purchases,
            counters.tokens_spent,
            counters.wager_wins,
            counters.wager_losses,
            counters.wager_ties
        );
        Ok(())
    }
}

/// One-line reply for the console.
pub fn render_reply(reply: Result<CommandOutcome, CommandError>) -> String {
    let outcome = match reply {
        Ok(outcome) => outcome,
        Err(e) => return format!("error: {}", e),
    };
    match outcome {
        CommandOutcome::Purchased(p) => format!(
            "bought {} {} for {} tokens, balance {}",
            p.kind, p.item_id, p.price, p.balance_after
        ),
        CommandOutcome::SkinEquipped { weapon_id, skin_id } if skin_id == DEFAULT_SKIN_ID => {
            format!("{} skin reset to default", weapon_id)
        }
        CommandOutcome::SkinEquipped { weapon_id, skin_id } => {
            format!("{} now uses skin {}", weapon_id, skin_id)
        }
        CommandOutcome::AttachmentEquipped {
            slot,
            attachment_slot,
            attachment_id,
        } => format!("{} {} fitted with {}", slot, attachment_slot, attachment_id),
        CommandOutcome::WeaponSelected { slot, weapon_id } => {
            format!("{} weapon: {}", slot, weapon_id)
        }
        CommandOutcome::ArmorSelected { slot, armor_id } => format!("{} armor: {}", slot, armor_id),
        CommandOutcome::Wager(round) => {
            let verdict = match round.outcome {
                WagerOutcome::Win { payout } => format!("you win {}", payout),
                WagerOutcome::Lose => "house wins".to_string(),
                WagerOutcome::Tie => "tie, bet returned".to_string(),
            };
            format!(
                "rolled {} vs {}: {}, balance {}",
                round.player_roll, round.house_roll, verdict, round.balance_after
            )
        }
        CommandOutcome::SkinGranted {
            target,
            skin_id,
            newly_added: true,
        } => format!("granted skin {} to {}", skin_id, target),
        CommandOutcome::SkinGranted {
            target, skin_id, ..
        } => format!("{} already owns skin {}", target, skin_id),
        CommandOutcome::ProfileReset { target } => format!("profile {} reset", target),
        CommandOutcome::Balance { tokens } => format!("balance {}", tokens),
        CommandOutcome::Stats(s) => format!(
            "tokens {} kills {} deaths {} matches {} weapons {} skins {} armor {}",
            s.tokens,
            s.kills,
            s.deaths,
            s.matches_played,
            s.owned_weapons,
            s.owned_skins,
            s.owned_armor
        ),
    }
}
