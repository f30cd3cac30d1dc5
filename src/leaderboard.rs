//! Leaderboard service: best-effort score submission and retrieval.
//!
//! The bundled implementation keeps the top ten results in a JSON file in the
//! config directory. Callers treat every error as "no leaderboard data".

use crate::settings::{StorageError, config_dir, read_json, write_json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of entries kept.
pub const MAX_ENTRIES: usize = 10;
const FILENAME: &str = "leaderboard.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub score: u32,
    pub crushed: u32,
    /// Unix seconds.
    pub timestamp: u64,
}

impl LeaderboardEntry {
    pub fn now(player: &str, score: u32, crushed: u32) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            player: player.to_string(),
            score,
            crushed,
            timestamp,
        }
    }
}

/// Remote or local score service, consulted only at session boundaries.
pub trait Leaderboard {
    /// Returns the 1-based rank achieved, or `None` if the score did not place.
    fn submit(&mut self, entry: LeaderboardEntry) -> Result<Option<usize>, StorageError>;
    /// Best first.
    fn fetch(&self) -> Result<Vec<LeaderboardEntry>, StorageError>;
}

/// Sorted top-N table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub entries: Vec<LeaderboardEntry>,
}

impl Standings {
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Inserts in descending score order; ties keep the earlier entry first.
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_ENTRIES);
        Some(pos + 1)
    }

    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }
}

/// File-backed leaderboard.
#[derive(Debug, Clone)]
pub struct LocalLeaderboard {
    path: PathBuf,
}

impl LocalLeaderboard {
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::at(config_dir()?.join(FILENAME)))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Standings, StorageError> {
        match read_json(&self.path) {
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Standings::default())
            }
            other => other,
        }
    }
}

impl Leaderboard for LocalLeaderboard {
    fn submit(&mut self, entry: LeaderboardEntry) -> Result<Option<usize>, StorageError> {
        let mut standings = self.load()?;
        let rank = standings.insert(entry);
        if rank.is_some() {
            write_json(&self.path, &standings)?;
        }
        Ok(rank)
    }

    fn fetch(&self) -> Result<Vec<LeaderboardEntry>, StorageError> {
        Ok(self.load()?.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u32) -> LeaderboardEntry {
        LeaderboardEntry {
            player: "p".into(),
            score,
            crushed: 1,
            timestamp: 0,
        }
    }

    #[test]
    fn keeps_top_entries_in_order() {
        let mut s = Standings::default();
        assert_eq!(s.insert(entry(50)), Some(1));
        assert_eq!(s.insert(entry(100)), Some(1));
        assert_eq!(s.insert(entry(75)), Some(2));
        assert_eq!(s.insert(entry(75)), Some(3));
        let scores: Vec<u32> = s.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![100, 75, 75, 50]);
        assert_eq!(s.top_score(), Some(100));
    }

    #[test]
    fn zero_never_places_and_table_is_capped() {
        let mut s = Standings::default();
        assert_eq!(s.insert(entry(0)), None);
        for i in 1..=MAX_ENTRIES as u32 {
            s.insert(entry(i * 10));
        }
        assert_eq!(s.insert(entry(5)), None);
        assert_eq!(s.insert(entry(15)), Some(MAX_ENTRIES));
        assert_eq!(s.entries.len(), MAX_ENTRIES);
        assert_eq!(s.entries.last().unwrap().score, 15);
    }

    #[test]
    fn local_board_persists_and_tolerates_missing_file() {
        let path = std::env::temp_dir()
            .join(format!("tilecrush-board-{}", std::process::id()))
            .join(FILENAME);
        let _ = std::fs::remove_file(&path);
        let mut board = LocalLeaderboard::at(path.clone());
        assert!(board.fetch().unwrap().is_empty());
        assert_eq!(board.submit(entry(40)).unwrap(), Some(1));
        assert_eq!(board.submit(entry(0)).unwrap(), None);
        let reopened = LocalLeaderboard::at(path.clone());
        assert_eq!(reopened.fetch().unwrap(), vec![entry(40)]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = std::env::temp_dir()
            .join(format!("tilecrush-corrupt-{}", std::process::id()))
            .join(FILENAME);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();
        let board = LocalLeaderboard::at(path.clone());
        assert!(matches!(board.fetch(), Err(StorageError::Json(_))));
        let _ = std::fs::remove_file(&path);
    }
}
