//! Per-player sliding-window throttle for mutating commands.
//!
//! Each identity keeps a queue of accepted action instants. On every check,
//! instants older than the window are dropped; the action is accepted while
//! fewer than `max_actions` remain. Rejected attempts are not recorded.

use log::warn;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::profile::PlayerId;

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throttled {
    pub identity: PlayerId,
    pub limit: usize,
    pub window: Duration,
}

impl fmt::Display for Throttled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "player {} exceeded {} actions per {}ms",
            self.identity,
            self.limit,
            self.window.as_millis()
        )
    }
}

/// Rate limiting statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStats {
    pub tracked_players: usize,
    pub max_actions: usize,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_actions: usize,
    window: Duration,
    history: Arc<RwLock<HashMap<PlayerId, VecDeque<Instant>>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

impl RateLimiter {
    pub fn new(max_actions: usize, window: Duration) -> Self {
        Self {
            max_actions,
            window,
            history: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_actions, config.window())
    }

    pub fn allow(&self, identity: PlayerId) -> bool {
        self.check_at(identity, Instant::now()).is_ok()
    }

    pub fn allow_at(&self, identity: PlayerId, now: Instant) -> bool {
        self.check_at(identity, now).is_ok()
    }

    /// Record an action at `now` if the window has room.
    pub fn check_at(&self, identity: PlayerId, now: Instant) -> Result<(), Throttled> {
        let mut history = self.history.write().unwrap_or_else(|p| p.into_inner());
        let queue = history.entry(identity).or_default();
        while let Some(&oldest) = queue.front() {
            if now.saturating_duration_since(oldest) > self.window {
                queue.pop_front();
            } else {
                break;
            }
        }
        if queue.len() >= self.max_actions {
            let reason = Throttled {
                identity,
                limit: self.max_actions,
                window: self.window,
            };
            warn!(target: "security", "Throttled: {}", reason);
            return Err(reason);
        }
        queue.push_back(now);
        Ok(())
    }

    /// Drop the history for one player. Returns whether any was held.
    pub fn forget(&self, identity: PlayerId) -> bool {
        let mut history = self.history.write().unwrap_or_else(|p| p.into_inner());
        history.remove(&identity).is_some()
    }

    pub fn stats(&self) -> RateLimitStats {
        let history = self.history.read().unwrap_or_else(|p| p.into_inner());
        RateLimitStats {
            tracked_players: history.len(),
            max_actions: self.max_actions,
            window: self.window,
        }
    }
}
