//! Persisted leaderboard: a ranked JSON file of the best runs.
//!
//! The ledger owns all access to the store. Persistence is best-effort: a
//! missing or unreadable file reads as an empty board, and failed writes are
//! dropped with a warning. Gameplay never blocks on this path; reads and
//! writes happen only at session boundaries.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_ENTRIES: usize = 10;
pub const NAME_LEN: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub level: u32,
    pub timestamp: u64,
}

#[derive(Resource, Debug, Clone)]
pub struct Leaderboard {
    path: Option<PathBuf>,
}

impl Leaderboard {
    /// A board backed by the given file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A board with no backing store: reads are empty, writes are dropped.
    pub fn detached() -> Self {
        Self { path: None }
    }

    /// The platform data directory, or detached when there is none.
    pub fn default_location() -> Self {
        match dirs::data_dir() {
            Some(dir) => Self::at(dir.join("rescue-run").join("leaderboard.json")),
            None => {
                warn!("no platform data directory; leaderboard persistence disabled");
                Self::detached()
            }
        }
    }

    /// Ranked entries, best first. Empty on any read or parse failure.
    pub fn entries(&self) -> Vec<ScoreEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(raw) = fs::read_to_string(path) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Insert a run and persist the updated board. Returns the new ranking.
    ///
    /// The sort is stable and entries are appended before sorting, so equal
    /// scores keep first-write order. The board is truncated to
    /// [`MAX_ENTRIES`].
    pub fn submit(&self, name: &str, score: u32, level: u32) -> Vec<ScoreEntry> {
        let mut board = self.entries();
        board.push(ScoreEntry {
            name: normalize_name(name),
            score,
            level,
            timestamp: now_secs(),
        });
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board.truncate(MAX_ENTRIES);
        self.write(&board);
        board
    }

    fn write(&self, board: &[ScoreEntry]) {
        let Some(path) = &self.path else {
            return;
        };
        let Ok(contents) = serde_json::to_string_pretty(board) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(path, contents) {
            warn!("leaderboard write failed: {err}");
        }
    }
}

/// Force a name into exactly [`NAME_LEN`] uppercase ASCII-alphanumeric chars.
pub fn normalize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(NAME_LEN)
        .collect();
    while name.len() < NAME_LEN {
        name.push('A');
    }
    name
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
