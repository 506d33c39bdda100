#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence contracts and the typed journal built on top of them.
//!
//! Storage is a flat string key-value map. [`FileStore`] keeps the whole map
//! in one JSON file and rewrites it on every set; [`MemoryStore`] backs
//! tests. The [`Journal`] layers the typed records on top: per-game history
//! lists, last-played flags, the daily progress map and symptom check-ins.
//!
//! Journal writes never propagate failures. A session that finished is worth
//! more than a record that could not be written, so write errors and
//! malformed blobs are logged at warn level and play continues.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mindspan_core::{GameKind, SessionRecord, SymptomReport};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

const KEY_DAILY_PROGRESS: &str = "daily_progress";
const KEY_SYMPTOMS: &str = "symptoms";

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file could not be read.
    #[error("failed to read store file {path}: {source}")]
    Read {
        /// File the store lives in.
        path: PathBuf,
        /// Underlying IO failure.
        source: io::Error,
    },
    /// The store file could not be written.
    #[error("failed to write store file {path}: {source}")]
    Write {
        /// File the store lives in.
        path: PathBuf,
        /// Underlying IO failure.
        source: io::Error,
    },
    /// The store file does not hold a JSON string map.
    #[error("store file {path} holds malformed JSON: {source}")]
    Malformed {
        /// File the store lives in.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
}

/// Flat string key-value persistence contract.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

/// In-memory store used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Store keeping the whole key-value map in a single JSON file.
///
/// The file is parsed once on open. Every set rewrites the full map to a
/// sibling staging file and renames it into place, so an interrupted write
/// leaves the previous file intact. A missing file opens as an empty store;
/// a file that is not a JSON string map is refused with
/// [`StoreError::Malformed`] so the caller can decide what to do with it
/// instead of silently losing it on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store backed by `path`, creating an empty map if absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(source) if source.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        Ok(Self { path, entries })
    }

    /// File the store persists to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;

        let staging = staging_path(&self.path);
        fs::write(&staging, raw).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value);
        self.persist()
    }
}

/// Typed journal layered over a key-value store.
#[derive(Debug)]
pub struct Journal<S> {
    store: S,
}

impl<S> Journal<S>
where
    S: KeyValueStore,
{
    /// Wraps a store in the journal layer.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records a finished session: appends it to the game's history, stamps
    /// the last-played flag and marks the daily progress map.
    ///
    /// Write failures are logged and swallowed.
    pub fn record_session(&mut self, record: &SessionRecord) {
        let mut history = self.history(record.game);
        history.push(record.clone());
        self.write_blob(&history_key(record.game), &history);

        self.set_raw(&last_played_key(record.game), record.date.clone());
        self.mark_daily_progress(&record.date, record.game);
    }

    /// History of one game, oldest first. Malformed blobs read as empty.
    #[must_use]
    pub fn history(&self, game: GameKind) -> Vec<SessionRecord> {
        self.read_or_default(&history_key(game))
    }

    /// Merges imported history records into one game's history.
    ///
    /// Records are keyed by date: dates already present keep the local
    /// record, new dates are inserted in date order. Returns the number of
    /// records added.
    pub fn merge_history(&mut self, game: GameKind, incoming: &[SessionRecord]) -> usize {
        let mut history = self.history(game);
        let mut added = 0_usize;

        for record in incoming {
            if history.iter().any(|known| known.date == record.date) {
                continue;
            }
            history.push(record.clone());
            added += 1;
        }

        if added > 0 {
            history.sort_by(|a, b| a.date.cmp(&b.date));
            self.write_blob(&history_key(game), &history);
        }

        added
    }

    /// Date one game was last played on, if ever.
    #[must_use]
    pub fn last_played(&self, game: GameKind) -> Option<String> {
        match self.store.get(&last_played_key(game)) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(game = game.slug(), %error, "store read failed");
                None
            }
        }
    }

    /// Map of date to the game slugs completed on that date.
    #[must_use]
    pub fn daily_progress(&self) -> BTreeMap<String, Vec<String>> {
        self.read_or_default(KEY_DAILY_PROGRESS)
    }

    /// Stores a symptom check-in, replacing any report for the same date.
    pub fn record_symptoms(&mut self, report: &SymptomReport) {
        let mut reports: BTreeMap<String, SymptomReport> = self.read_or_default(KEY_SYMPTOMS);
        let _ = reports.insert(report.date.clone(), report.clone());
        self.write_blob(KEY_SYMPTOMS, &reports);
    }

    /// All symptom check-ins, oldest date first.
    #[must_use]
    pub fn symptom_history(&self) -> Vec<SymptomReport> {
        let reports: BTreeMap<String, SymptomReport> = self.read_or_default(KEY_SYMPTOMS);
        reports.into_values().collect()
    }

    /// Symptom check-in recorded for one date, if any.
    #[must_use]
    pub fn symptoms_on(&self, date: &str) -> Option<SymptomReport> {
        let mut reports: BTreeMap<String, SymptomReport> = self.read_or_default(KEY_SYMPTOMS);
        reports.remove(date)
    }

    fn mark_daily_progress(&mut self, date: &str, game: GameKind) {
        let mut progress = self.daily_progress();
        let games = progress.entry(date.to_owned()).or_default();
        let slug = game.slug();
        if !games.iter().any(|known| known == slug) {
            games.push(slug.to_owned());
        }
        self.write_blob(KEY_DAILY_PROGRESS, &progress);
    }

    fn read_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(key, %error, "discarding malformed blob");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(error) => {
                tracing::warn!(key, %error, "store read failed");
                T::default()
            }
        }
    }

    fn write_blob<T>(&mut self, key: &str, value: &T)
    where
        T: Serialize,
    {
        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw),
            Err(error) => tracing::warn!(key, %error, "blob serialisation failed"),
        }
    }

    fn set_raw(&mut self, key: &str, value: String) {
        if let Err(error) = self.store.set(key, value) {
            tracing::warn!(key, %error, "store write failed");
        }
    }
}

fn history_key(game: GameKind) -> String {
    format!("history:{}", game.slug())
}

fn last_played_key(game: GameKind) -> String {
    format!("last_played:{}", game.slug())
}
