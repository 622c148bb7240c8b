//! # Configuration Management Module
//!
//! Typed configuration for the arena economy, loaded from a TOML file with
//! defaults for every section so a partial file is still usable.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - token grants, kill reward, admin refill, autosave cadence
//! - [`WagerConfig`] - dice mini-game bet limits and cooldown
//! - [`RateLimitConfig`] - per-player command throttle
//! - [`StorageConfig`] - data directory holding profiles and catalog documents
//! - [`LoggingConfig`] - log level and file targets
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arena_economy::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Starting tokens: {}", config.game.starting_tokens);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! admins = [76561198000000000]
//!
//! [game]
//! starting_tokens = 500
//! tokens_per_kill = 10
//! admin_daily_tokens = 10000
//! daily_refill_enabled = true
//! autosave_interval_secs = 300
//!
//! [wager]
//! min_bet = 10
//! max_bet = 100
//! cooldown_secs = 30
//!
//! [storage]
//! data_dir = "./data"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

use crate::profile::PlayerId;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Identities allowed to run admin commands.
    #[serde(default)]
    pub admins: Vec<PlayerId>,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub wager: WagerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_tokens: u64,
    pub tokens_per_kill: u64,
    pub admin_daily_tokens: u64,
    pub daily_refill_enabled: bool,
    pub autosave_interval_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_tokens: 500,
            tokens_per_kill: 10,
            admin_daily_tokens: 10_000,
            daily_refill_enabled: true,
            autosave_interval_secs: 300,
        }
    }
}

impl GameConfig {
    /// Autosave period, never shorter than one second.
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WagerConfig {
    pub min_bet: u64,
    pub max_bet: u64,
    pub cooldown_secs: u64,
}

impl Default for WagerConfig {
    fn default() -> Self {
        Self {
            min_bet: 10,
            max_bet: 100,
            cooldown_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Mutating commands accepted per window.
    pub max_actions: usize,
    pub window_ms: u64,
    /// Drop a player's throttle history when their session ends.
    pub evict_on_disconnect: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_actions: 5,
            window_ms: 1000,
            evict_on_disconnect: true,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn profiles_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("profiles")
    }

    pub fn catalog_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("catalog")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// Separate file for throttle and admin audit events.
    pub security_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("arena-economy.log".to_string()),
            security_file: Some("arena-economy-security.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject combinations the economy cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.wager.min_bet == 0 || self.wager.min_bet > self.wager.max_bet {
            return Err(anyhow!(
                "wager.min_bet must be between 1 and max_bet ({} > {})",
                self.wager.min_bet,
                self.wager.max_bet
            ));
        }
        if self.rate_limit.max_actions == 0 {
            return Err(anyhow!("rate_limit.max_actions must be at least 1"));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(anyhow!("rate_limit.window_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn is_admin(&self, identity: PlayerId) -> bool {
        self.admins.contains(&identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_tokens, 500);
        assert_eq!(config.tokens_per_kill, 10);
        assert_eq!(config.admin_daily_tokens, 10_000);
        assert!(config.daily_refill_enabled);
        assert_eq!(config.autosave_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
admins = [42]

[wager]
max_bet = 250
"#,
        )
        .unwrap();
        assert!(config.is_admin(PlayerId(42)));
        assert!(!config.is_admin(PlayerId(7)));
        assert_eq!(config.wager.min_bet, 10);
        assert_eq!(config.wager.max_bet, 250);
        assert_eq!(config.wager.cooldown_secs, 30);
        assert_eq!(config.rate_limit.max_actions, 5);
        assert_eq!(config.storage.data_dir, "./data");
    }

    #[test]
    fn test_logging_section_with_only_file() {
        let config: Config = toml::from_str(
            r#"
[logging]
file = "/var/log/arena.log"
"#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file.as_deref(), Some("/var/log/arena.log"));
        assert!(config.logging.security_file.is_some());
    }

    #[test]
    fn test_validate_rejects_inverted_bet_range() {
        let mut config = Config::default();
        config.wager.min_bet = 200;
        assert!(config.validate().is_err());
        config.wager.min_bet = 0;
        assert!(config.validate().is_err());
        config.wager.min_bet = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig {
            data_dir: "/srv/arena".to_string(),
        };
        assert_eq!(storage.profiles_dir(), PathBuf::from("/srv/arena/profiles"));
        assert_eq!(storage.catalog_dir(), PathBuf::from("/srv/arena/catalog"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.game.starting_tokens, 500);
        assert_eq!(parsed.rate_limit.window(), Duration::from_millis(1000));
        assert!(parsed.admins.is_empty());
    }
}
