//! In-process economy counters.
//!
//! Global atomics updated from the economy, wager, storage and command
//! layers; [`snapshot`] reads them for the `status` console command.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static PURCHASES: AtomicU64 = AtomicU64::new(0);
static TOKENS_SPENT: AtomicU64 = AtomicU64::new(0);
static TOKENS_AWARDED: AtomicU64 = AtomicU64::new(0);
static WAGER_WINS: AtomicU64 = AtomicU64::new(0);
static WAGER_LOSSES: AtomicU64 = AtomicU64::new(0);
static WAGER_TIES: AtomicU64 = AtomicU64::new(0);
static KILLS_RECORDED: AtomicU64 = AtomicU64::new(0);
static PROFILE_SAVES: AtomicU64 = AtomicU64::new(0);
static PROFILE_SAVE_FAILURES: AtomicU64 = AtomicU64::new(0);
static THROTTLED: AtomicU64 = AtomicU64::new(0);

static COMMAND_COUNTERS: OnceLock<Mutex<HashMap<&'static str, CommandCounter>>> = OnceLock::new();

pub fn record_purchase(price: u64) {
    PURCHASES.fetch_add(1, Ordering::Relaxed);
    TOKENS_SPENT.fetch_add(price, Ordering::Relaxed);
}

pub fn record_tokens_awarded(amount: u64) {
    TOKENS_AWARDED.fetch_add(amount, Ordering::Relaxed);
}

pub fn inc_wager_win() {
    WAGER_WINS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_wager_loss() {
    WAGER_LOSSES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_wager_tie() {
    WAGER_TIES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_kill() {
    KILLS_RECORDED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_profile_save() {
    PROFILE_SAVES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_profile_save_failure() {
    PROFILE_SAVE_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_throttled() {
    THROTTLED.fetch_add(1, Ordering::Relaxed);
}

/// Accepted and rejected executions of one command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommandCounter {
    pub accepted: u64,
    pub rejected: u64,
}

fn command_counter_lock() -> &'static Mutex<HashMap<&'static str, CommandCounter>> {
    COMMAND_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_command(name: &'static str, accepted: bool) -> CommandCounter {
    let mut guard = command_counter_lock()
        .lock()
        .expect("command counter mutex poisoned");
    let counter = guard.entry(name).or_default();
    if accepted {
        counter.accepted = counter.accepted.saturating_add(1);
    } else {
        counter.rejected = counter.rejected.saturating_add(1);
    }
    *counter
}

pub fn command_counters_snapshot() -> HashMap<&'static str, CommandCounter> {
    command_counter_lock()
        .lock()
        .expect("command counter mutex poisoned")
        .clone()
}

#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub purchases: u64,
    pub tokens_spent: u64,
    pub tokens_awarded: u64,
    pub wager_wins: u64,
    pub wager_losses: u64,
    pub wager_ties: u64,
    pub kills_recorded: u64,
    pub profile_saves: u64,
    pub profile_save_failures: u64,
    pub throttled: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        purchases: PURCHASES.load(Ordering::Relaxed),
        tokens_spent: TOKENS_SPENT.load(Ordering::Relaxed),
        tokens_awarded: TOKENS_AWARDED.load(Ordering::Relaxed),
        wager_wins: WAGER_WINS.load(Ordering::Relaxed),
        wager_losses: WAGER_LOSSES.load(Ordering::Relaxed),
        wager_ties: WAGER_TIES.load(Ordering::Relaxed),
        kills_recorded: KILLS_RECORDED.load(Ordering::Relaxed),
        profile_saves: PROFILE_SAVES.load(Ordering::Relaxed),
        profile_save_failures: PROFILE_SAVE_FAILURES.load(Ordering::Relaxed),
        throttled: THROTTLED.load(Ordering::Relaxed),
    }
}
