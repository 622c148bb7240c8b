//! # Session Registry
//!
//! In-memory map from connected player to their live [`Session`]. The
//! registry owns the profile lifecycle: load on first touch, save and evict
//! on disconnect, periodic save of everything resident.
//!
//! ## Locking
//!
//! Each session sits behind its own mutex, so commands for different players
//! run in parallel while commands for one player are serialized. The map
//! lock covers lookups, insertion (including the profile read for a new
//! session) and removal. When both are needed the session lock is taken
//! first; nothing locks a session while holding the map lock.
//!
//! A removed session is marked closed before its lock is released, and its
//! map entry is dropped only after the final save. A later load therefore
//! always sees that save, and [`SessionRegistry::with_session`] never hands
//! out a closed session.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::profile::{PlayerId, PlayerProfile};
use crate::ratelimit::RateLimiter;
use crate::storage::{PersistenceError, ProfileStore};

/// Live state for one connected player.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: PlayerId,
    pub profile: PlayerProfile,
    /// Cooldown stamp for the dice wager.
    pub last_wager_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    closed: bool,
}

impl Session {
    pub fn new(profile: PlayerProfile) -> Self {
        let now = Utc::now();
        Self {
            identity: profile.identity,
            profile,
            last_wager_at: None,
            connected_at: now,
            last_activity: now,
            closed: false,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Set once the session has been saved for the last time and evicted.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Lock a session, recovering the data if a previous holder panicked.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(|p| p.into_inner())
}

/// Result of a save-everything pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveSweep {
    pub saved: usize,
    pub failed: Vec<PlayerId>,
}

pub struct SessionRegistry {
    store: Arc<ProfileStore>,
    sessions: Mutex<HashMap<PlayerId, SessionHandle>>,
    /// Throttle history to drop when a session ends.
    limiter: Option<Arc<RateLimiter>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<ProfileStore>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
            limiter: None,
        }
    }

    /// Forget a player's rate-limit history whenever their session is removed.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    fn map(&self) -> MutexGuard<'_, HashMap<PlayerId, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Resident session for `identity`, loading the profile if needed.
    pub fn get_or_create(&self, identity: PlayerId) -> SessionHandle {
        let mut map = self.map();
        if let Some(existing) = map.get(&identity) {
            return Arc::clone(existing);
        }
        let handle = Arc::new(Mutex::new(Session::new(self.store.load(identity))));
        map.insert(identity, Arc::clone(&handle));
        debug!("Session opened for {}", identity);
        handle
    }

    /// Run `f` on the live session for `identity`, loading it if needed.
    pub fn with_session<R>(&self, identity: PlayerId, f: impl FnOnce(&mut Session) -> R) -> R {
        loop {
            let handle = self.get_or_create(identity);
            let mut session = lock_session(&handle);
            if !session.closed {
                return f(&mut *session);
            }
        }
    }

    /// Like [`with_session`](Self::with_session) but never loads; `None`
    /// when the player has no session.
    pub fn with_resident<R>(
        &self,
        identity: PlayerId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        loop {
            let handle = self.get(identity)?;
            let mut session = lock_session(&handle);
            if !session.closed {
                return Some(f(&mut *session));
            }
        }
    }

    /// Resident session without implicit loading.
    pub fn get(&self, identity: PlayerId) -> Option<SessionHandle> {
        self.map().get(&identity).cloned()
    }

    pub fn is_active(&self, identity: PlayerId) -> bool {
        self.map().contains_key(&identity)
    }

    /// Save the profile held by a locked session.
    pub fn save_session(&self, session: &mut Session) -> Result<(), PersistenceError> {
        self.store.save(&mut session.profile).map_err(|e| {
            warn!("{}; in-memory profile for {} kept", e, session.identity);
            e
        })
    }

    /// Final save and eviction. Returns `None` if the player had no session.
    ///
    /// The session is evicted even when the save fails; the error is
    /// returned so the caller can report it.
    pub fn remove(&self, identity: PlayerId) -> Option<Result<(), PersistenceError>> {
        let handle = self.get(identity)?;
        let result = {
            let mut session = lock_session(&handle);
            if session.closed {
                return None;
            }
            let result = self.save_session(&mut session);
            session.closed = true;
            let mut map = self.map();
            if map.get(&identity).map_or(false, |h| Arc::ptr_eq(h, &handle)) {
                map.remove(&identity);
            }
            result
        };
        if let Some(limiter) = &self.limiter {
            limiter.forget(identity);
        }
        debug!("Session closed for {}", identity);
        Some(result)
    }

    /// Snapshot of resident sessions.
    pub fn for_each_active(&self) -> Vec<SessionHandle> {
        self.map().values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.map().len()
    }

    /// Save every resident session.
    pub fn save_all(&self) -> SaveSweep {
        let mut sweep = SaveSweep::default();
        for handle in self.for_each_active() {
            let mut session = lock_session(&handle);
            if session.closed {
                continue;
            }
            match self.save_session(&mut session) {
                Ok(()) => sweep.saved += 1,
                Err(_) => sweep.failed.push(session.identity),
            }
        }
        if !sweep.failed.is_empty() {
            warn!(
                "Autosave: {} saved, {} failed",
                sweep.saved,
                sweep.failed.len()
            );
        }
        sweep
    }

    /// Save and evict every resident session.
    pub fn close_all(&self) -> SaveSweep {
        let ids: Vec<PlayerId> = self.map().keys().copied().collect();
        let mut sweep = SaveSweep::default();
        for id in ids {
            match self.remove(id) {
                Some(Ok(())) => sweep.saved += 1,
                Some(Err(_)) => sweep.failed.push(id),
                None => {}
            }
        }
        info!("Closed {} sessions", sweep.saved + sweep.failed.len());
        sweep
    }

    /// Replace a player's profile with a fresh one and persist it.
    ///
    /// A resident session keeps its wager cooldown but gets the new profile.
    pub fn reset_profile(&self, identity: PlayerId) -> Result<(), PersistenceError> {
        let resident = self.with_resident(identity, |session| {
            session.profile = self.store.fresh_profile(identity);
            self.save_session(session)
        });
        if let Some(result) = resident {
            return result;
        }
        // Offline: hold the map so no session can load the old record
        // while the fresh one is written.
        let map = self.map();
        if map.contains_key(&identity) {
            drop(map);
            return self.reset_profile(identity);
        }
        self.store.save(&mut self.store.fresh_profile(identity))
    }
}
