//! Thread store: durable `issue key → thread id` mapping.
//!
//! Persists a flat JSON object at `<home>/.sprintcord/threads.json` (or a
//! configured path). Writes use the atomic `.tmp` + rename pattern, so a crash
//! mid-write leaves the previous snapshot intact.
//!
//! The mapping is an advisory cache of which threads we believe exist; the
//! platform's thread set is the ground truth. An unreadable snapshot is
//! therefore treated as empty rather than as a startup failure.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sprintcord_core::{IssueKey, ThreadId};

use crate::error::{io_err, SyncError};

/// In-memory mapping, ordered by key so snapshots diff cleanly.
pub type ThreadMap = BTreeMap<IssueKey, ThreadId>;

/// What [`ThreadStore::open`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid snapshot with this many entries.
    Loaded { entries: usize },
    /// No snapshot yet; starting empty.
    Missing,
    /// The snapshot exists but could not be read or parsed; starting empty.
    /// The next successful save overwrites it.
    Corrupt { reason: String },
}

/// Path to the default thread store, rooted at `home`.
///
/// `~/.sprintcord/threads.json`
pub fn store_path_at(home: &Path) -> PathBuf {
    home.join(".sprintcord").join("threads.json")
}

/// Read the snapshot at `path` without side effects.
pub fn load_at(path: &Path) -> (ThreadMap, LoadOutcome) {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return (ThreadMap::new(), LoadOutcome::Missing);
        }
        Err(err) => {
            return (
                ThreadMap::new(),
                LoadOutcome::Corrupt {
                    reason: format!("read failed: {err}"),
                },
            );
        }
    };
    match serde_json::from_str::<ThreadMap>(&contents) {
        Ok(map) => {
            let entries = map.len();
            (map, LoadOutcome::Loaded { entries })
        }
        Err(err) => (
            ThreadMap::new(),
            LoadOutcome::Corrupt {
                reason: format!("parse failed: {err}"),
            },
        ),
    }
}

/// Overwrite the snapshot at `path` with `map` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(path: &Path, map: &ThreadMap) -> Result<(), SyncError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(map)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// The loaded mapping plus the path it is persisted to.
#[derive(Debug, Clone)]
pub struct ThreadStore {
    path: PathBuf,
    map: ThreadMap,
}

impl ThreadStore {
    /// Load the store at `path`, logging anything other than a clean load.
    pub fn open(path: impl Into<PathBuf>) -> (Self, LoadOutcome) {
        let path = path.into();
        let (map, outcome) = load_at(&path);
        match &outcome {
            LoadOutcome::Loaded { entries } => {
                tracing::info!(path = %path.display(), entries, "loaded thread store");
            }
            LoadOutcome::Missing => {
                tracing::info!(path = %path.display(), "no thread store yet; starting empty");
            }
            LoadOutcome::Corrupt { reason } => {
                tracing::warn!(
                    path = %path.display(),
                    reason = %reason,
                    "thread store unreadable; starting empty",
                );
            }
        }
        (Self { path, map }, outcome)
    }

    /// An empty store that will persist to `path`. Does not touch the disk.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map: ThreadMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &IssueKey) -> Option<&ThreadId> {
        self.map.get(key)
    }

    /// Record `thread` for `key`, returning the handle it replaced.
    pub fn insert(&mut self, key: IssueKey, thread: ThreadId) -> Option<ThreadId> {
        self.map.insert(key, thread)
    }

    pub fn entries(&self) -> &ThreadMap {
        &self.map
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Reset to empty in memory and hand back the previous mapping.
    /// Callers persist with [`ThreadStore::save`].
    pub fn clear(&mut self) -> ThreadMap {
        std::mem::take(&mut self.map)
    }

    /// Persist the full mapping, replacing the previous snapshot.
    pub fn save(&self) -> Result<(), SyncError> {
        save_at(&self.path, &self.map)
    }
}
