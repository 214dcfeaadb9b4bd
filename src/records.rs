//! Match record persistence
//!
//! Completed matches and tournament results are appended to a flat,
//! category-keyed log. The match engine only needs the narrow
//! [`RecordSink`] interface; this module provides an in-memory sink and a
//! JSON file sink that rewrites the whole log on every append.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::warn;

use crate::constants::records::DEFAULT_FILE;

/// The categories every record log starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    /// Completed player-versus-player matches
    PlayerVsPlayer,
    /// Completed player-versus-CPU matches
    PlayerVsCpu,
    /// Tournament champions
    TournamentWinners,
}

impl RecordCategory {
    /// Every known category
    pub const ALL: [RecordCategory; 3] = [
        RecordCategory::PlayerVsPlayer,
        RecordCategory::PlayerVsCpu,
        RecordCategory::TournamentWinners,
    ];

    /// The key the category is stored under
    pub fn key(self) -> &'static str {
        match self {
            RecordCategory::PlayerVsPlayer => "player_vs_player",
            RecordCategory::PlayerVsCpu => "player_vs_cpu",
            RecordCategory::TournamentWinners => "tournament_winners",
        }
    }
}

/// Errors that can occur while writing records
#[derive(Error, Debug)]
pub enum Error {
    /// The record file could not be written
    #[error("could not write records: {0}")]
    Io(#[from] io::Error),
    /// The records could not be serialized
    #[error("could not serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome entry written when a player-versus-player match completes
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// `"<player 1> vs <player 2>"`
    #[serde(rename = "match")]
    pub label: String,
    /// Name of the winner, absent when the match was tied
    pub winner: Option<String>,
    /// Final scores of both seats
    pub scores: [u32; 2],
    /// When the match completed
    pub date: DateTime<Utc>,
}

/// Category-keyed record log
///
/// Known categories are always present. Unknown categories are created the
/// first time something is appended to them. Entries keep insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<Value>>", into = "BTreeMap<String, Vec<Value>>")]
pub struct Records(BTreeMap<String, Vec<Value>>);

impl Default for Records {
    fn default() -> Self {
        Self(
            RecordCategory::ALL
                .into_iter()
                .map(|category| (category.key().to_string(), Vec::new()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Vec<Value>>> for Records {
    /// Fills in any known category missing from the stored map
    fn from(mut map: BTreeMap<String, Vec<Value>>) -> Self {
        for category in RecordCategory::ALL {
            map.entry(category.key().to_string()).or_default();
        }
        Self(map)
    }
}

impl From<Records> for BTreeMap<String, Vec<Value>> {
    fn from(records: Records) -> Self {
        records.0
    }
}

impl Records {
    /// Entries stored under `category`, empty if the category does not exist
    pub fn get(&self, category: &str) -> &[Value] {
        self.0.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// Appends an entry, creating the category on demand
    pub fn push(&mut self, category: &str, entry: Value) {
        self.0.entry(category.to_string()).or_default().push(entry);
    }

    /// Category names currently present
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Parses a stored log, falling back to empty defaults when it is corrupt
    pub fn parse_or_default(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            warn!(error = %e, "Corrupt record store, starting empty");
            Self::default()
        })
    }
}

/// Append-only store of match outcomes
pub trait RecordSink {
    /// Returns every stored record
    fn load(&self) -> Records;

    /// Appends a record to `category`
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be persisted.
    fn append(&mut self, category: &str, entry: Value) -> Result<(), Error>;
}

/// Record sink that keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Records,
}

impl MemorySink {
    /// Creates an empty in-memory sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordSink for MemorySink {
    fn load(&self) -> Records {
        self.records.clone()
    }

    fn append(&mut self, category: &str, entry: Value) -> Result<(), Error> {
        self.records.push(category, entry);
        Ok(())
    }
}

/// Record sink backed by a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
    records: Records,
}

impl Default for JsonFileSink {
    fn default() -> Self {
        Self::open(DEFAULT_FILE)
    }
}

impl JsonFileSink {
    /// Opens the log at `path`
    ///
    /// A missing, unreadable or corrupt file is treated as an empty log; the
    /// file is only written on the next append.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match fs::read_to_string(&path) {
            Ok(json) => Records::parse_or_default(&json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Records::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable record store, starting empty");
                Records::default()
            }
        };
        Self { path, records }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, records: &Records) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl RecordSink for JsonFileSink {
    fn load(&self) -> Records {
        self.records.clone()
    }

    /// Writes the log with the new entry, keeping memory unchanged if the write fails
    fn append(&mut self, category: &str, entry: Value) -> Result<(), Error> {
        let mut records = self.records.clone();
        records.push(category, entry);
        self.save(&records)?;
        self.records = records;
        Ok(())
    }
}
