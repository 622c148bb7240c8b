//! Test utilities & fixtures shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use arena_economy::catalog::{Catalog, CatalogHandle};
use arena_economy::commands::CommandProcessor;
use arena_economy::config::Config;
use arena_economy::economy::DiceRoller;
use arena_economy::profile::PlayerId;
use arena_economy::ratelimit::RateLimiter;
use arena_economy::session::SessionRegistry;
use arena_economy::storage::ProfileStore;

pub const ADMIN: PlayerId = PlayerId(76_561_198_000_000_001);
pub const ALICE: PlayerId = PlayerId(76_561_198_000_000_100);
pub const BOB: PlayerId = PlayerId(76_561_198_000_000_200);

/// Profile store rooted in a fresh temp dir.
pub fn temp_store(starting_tokens: u64) -> (tempfile::TempDir, Arc<ProfileStore>) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = ProfileStore::open(tmp.path().join("profiles"), starting_tokens).expect("store");
    (tmp, Arc::new(store))
}

/// Config pointing at `data_dir`, with [`ADMIN`] as the only admin.
pub fn test_config(data_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.storage.data_dir = data_dir.to_string_lossy().into_owned();
    config.admins = vec![ADMIN];
    config
}

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub processor: CommandProcessor,
}

/// Command processor over the built-in catalog and a temp profile store.
/// The throttle is relaxed so scripted command sequences are not rejected.
pub fn processor_fixture() -> Fixture {
    processor_fixture_with(|c| c.rate_limit.max_actions = 1_000)
}

pub fn processor_fixture_with(tweak: impl FnOnce(&mut Config)) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(dir.path());
    tweak(&mut config);
    let store = ProfileStore::open(config.storage.profiles_dir(), config.game.starting_tokens)
        .expect("store");
    let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
    let sessions =
        Arc::new(SessionRegistry::new(Arc::new(store)).with_rate_limiter(Arc::clone(&limiter)));
    let processor = CommandProcessor::new(
        &config,
        CatalogHandle::new(Catalog::builtin()),
        sessions,
        Arc::clone(&limiter),
    );
    Fixture {
        dir,
        config,
        limiter,
        processor,
    }
}

/// Dice that return a fixed script of faces.
pub struct ScriptedDice(pub VecDeque<u8>);

impl ScriptedDice {
    pub fn new(faces: &[u8]) -> Self {
        Self(faces.iter().copied().collect())
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self) -> u8 {
        self.0.pop_front().expect("dice script exhausted")
    }
}
