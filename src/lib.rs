//! # Arena Economy - Tokens, Items and Loadouts for an Arena Game Mode
//!
//! A player economy for a host game server: players earn tokens from kills,
//! spend them on weapons, skins and armor from a reloadable catalog, gamble
//! a little on a dice wager, and keep everything in a per-player profile
//! that survives restarts.
//!
//! ## Features
//!
//! - **Catalog**: Weapons with nested skins, armor by slot, attachments, rarity-tier pricing; hot reload without mixing old and new data.
//! - **Economy Engine**: Award, spend, purchase, equip and cycle operations that either fully apply or leave the profile untouched.
//! - **Dice Wager**: Bounded bets with a per-session cooldown and exact payouts.
//! - **Profile Store**: One JSON record per player, written with lock + temp file + rename so a crash never leaves a truncated record.
//! - **Sessions**: Load on connect, save on disconnect and on a timer; commands for one player are serialized, different players run in parallel.
//! - **Rate Limiting**: Sliding-window throttle on every mutating command.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arena_economy::config::Config;
//! use arena_economy::server::GameServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = GameServer::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`] - Item definitions, pricing and catalog documents
//! - [`economy`] - Wallet, ownership and loadout rules, dice wager
//! - [`profile`] - Player profile and loadout data model
//! - [`storage`] - Crash-safe profile persistence
//! - [`session`] - Resident sessions and their save lifecycle
//! - [`ratelimit`] - Per-player command throttle
//! - [`commands`] - Text command parsing and execution
//! - [`server`] - Console front end with autosave
//! - [`config`] - Configuration loading and defaults
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Console/Hooks  │ ← connect, disconnect, kill, commands
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │ Rate Limiter +  │ ← throttle, then dispatch
//! │ CommandProcessor│
//! └─────────────────┘
//!          │
//! ┌─────────────────┐     ┌─────────────────┐
//! │ Session Registry│ ──▶ │ Economy Engine  │ ← reads Catalog snapshot
//! └─────────────────┘     └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Profile Store  │ ← atomic JSON writes
//! └─────────────────┘
//! ```

pub mod catalog;
pub mod commands;
pub mod config;
pub mod economy;
pub mod logutil;
pub mod metrics;
pub mod profile;
pub mod ratelimit;
pub mod server;
pub mod session;
pub mod storage;
