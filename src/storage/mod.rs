//! # Storage Module - Profile Persistence
//!
//! One JSON document per player, keyed by identity:
//!
//! ```text
//! data/
//! ├── profiles/       ← <identity>.json player records
//! └── catalog/        ← weapons.json, armor.json
//! ```
//!
//! Writes go through [`write_atomic`]: a sibling lock file serializes
//! writers, the record is staged in a uniquely named temp file, fsynced and
//! renamed over the destination. A reader therefore sees either the previous
//! record or the new one, never a partial file.
//!
//! Loading never fails the caller. A missing record yields a fresh profile;
//! an unreadable one is moved aside to `<identity>.json.corrupt-<unix ts>`
//! and replaced by a fresh profile on the next save.

use chrono::Utc;
use fs2::FileExt;
use log::{debug, error, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metrics;
use crate::profile::{PlayerId, PlayerProfile};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {path}: {reason}")]
    ReadFailure { path: PathBuf, reason: String },
    #[error("failed to write {path}: {reason}")]
    WriteFailure { path: PathBuf, reason: String },
    #[error("corrupt profile record {path}: {reason}")]
    CorruptData { path: PathBuf, reason: String },
}

/// File-backed store of player profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    starting_tokens: u64,
}

impl ProfileStore {
    /// Open (creating if needed) the profile directory.
    pub fn open(dir: impl AsRef<Path>, starting_tokens: u64) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::WriteFailure {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            dir,
            starting_tokens,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn profile_path(&self, identity: PlayerId) -> PathBuf {
        self.dir.join(format!("{}.json", identity))
    }

    pub fn fresh_profile(&self, identity: PlayerId) -> PlayerProfile {
        PlayerProfile::new(identity, self.starting_tokens)
    }

    /// Load a profile, falling back to a fresh one on any problem.
    pub fn load(&self, identity: PlayerId) -> PlayerProfile {
        match self.try_load(identity) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                debug!("No stored profile for {}; starting fresh", identity);
                self.fresh_profile(identity)
            }
            Err(e @ PersistenceError::CorruptData { .. }) => {
                warn!("{}; starting fresh", e);
                self.quarantine(identity);
                self.fresh_profile(identity)
            }
            Err(e) => {
                error!("{}; starting fresh", e);
                self.fresh_profile(identity)
            }
        }
    }

    /// Strict load: `Ok(None)` when no record exists.
    pub fn try_load(&self, identity: PlayerId) -> Result<Option<PlayerProfile>, PersistenceError> {
        let path = self.profile_path(identity);
        let content = match fs::read(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::ReadFailure {
                    path,
                    reason: e.to_string(),
                })
            }
        };
        // Zero-filled tails from interrupted writes on some filesystems
        let end = content
            .iter()
            .rposition(|b| *b != 0 && !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        let profile: PlayerProfile =
            serde_json::from_slice(&content[..end]).map_err(|e| PersistenceError::CorruptData {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if profile.identity != identity {
            return Err(PersistenceError::CorruptData {
                path,
                reason: format!("record belongs to {}", profile.identity),
            });
        }
        Ok(Some(profile))
    }

    /// Stamp `last_updated` and durably replace the stored record.
    pub fn save(&self, profile: &mut PlayerProfile) -> Result<(), PersistenceError> {
        profile.last_updated = Utc::now();
        let path = self.profile_path(profile.identity);
        let result = serde_json::to_string_pretty(profile)
            .map_err(|e| e.to_string())
            .and_then(|json| write_atomic(&path, json.as_bytes()).map_err(|e| e.to_string()));
        match result {
            Ok(()) => {
                metrics::inc_profile_save();
                Ok(())
            }
            Err(reason) => {
                metrics::inc_profile_save_failure();
                Err(PersistenceError::WriteFailure { path, reason })
            }
        }
    }

    /// Number of stored profile records.
    pub fn count_profiles(&self) -> usize {
        fs::read_dir(&self.dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        let name = e.file_name();
                        let name = name.to_string_lossy();
                        !name.starts_with('.') && name.ends_with(".json")
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    fn quarantine(&self, identity: PlayerId) {
        let path = self.profile_path(identity);
        let target = self.dir.join(format!(
            "{}.json.corrupt-{}",
            identity,
            Utc::now().timestamp()
        ));
        match fs::rename(&path, &target) {
            Ok(()) => warn!(
                "Moved unreadable profile {} to {}",
                path.display(),
                target.display()
            ),
            Err(e) => error!("Could not move aside {}: {}", path.display(), e),
        }
    }
}

/// Replace `path` with `content` atomically.
///
/// Writers on the same path are serialized through an exclusive lock on a
/// hidden `.<name>.lock` sibling. The temp file is removed if any step
/// before the rename fails.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("record.json");

    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(dir.join(format!(".{}.lock", base)))?;
    lock_file.lock_exclusive()?;

    let mut counter = 0u32;
    let (tmp_path, mut tmp) = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => break (candidate, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
            }
            Err(e) => return Err(e),
        }
    };

    let staged = tmp
        .write_all(content)
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.sync_all());
    drop(tmp);
    if let Err(e) = staged.and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }

    // Unlock by dropping the lock file
    drop(lock_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_stamps_last_updated() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::open(dir.path(), 500).unwrap();
        let mut profile = store.fresh_profile(PlayerId(5));
        profile.last_updated = chrono::DateTime::<Utc>::default();
        store.save(&mut profile).unwrap();
        assert!(profile.last_updated.timestamp() > 0);
        assert_eq!(store.try_load(PlayerId(5)).unwrap(), Some(profile));
    }

    #[test]
    fn test_foreign_record_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::open(dir.path(), 500).unwrap();
        let mut other = store.fresh_profile(PlayerId(8));
        store.save(&mut other).unwrap();
        fs::copy(store.profile_path(PlayerId(8)), store.profile_path(PlayerId(9))).unwrap();
        assert!(matches!(
            store.try_load(PlayerId(9)),
            Err(PersistenceError::CorruptData { .. })
        ));
    }

    #[test]
    fn test_count_ignores_lock_and_quarantine_files() {
        let dir = TempDir::new().unwrap();
        let store = ProfileStore::open(dir.path(), 500).unwrap();
        for id in 1..=3 {
            store.save(&mut store.fresh_profile(PlayerId(id))).unwrap();
        }
        fs::write(dir.path().join("4.json.corrupt-1"), "junk").unwrap();
        assert_eq!(store.count_profiles(), 3);
    }
}
