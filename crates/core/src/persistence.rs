//! Persisted data: the high-score table and the progression config.
//!
//! Both are plain JSON. Loading never fails the game: the `load_or_default`
//! helpers log what went wrong and fall back to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::types::{HazardVariant, HIGH_SCORE_SLOTS, STOMPS_PER_TIER};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid progression config: {0}")]
    Invalid(&'static str),
}

fn read_file(path: &Path) -> Result<String, PersistError> {
    fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), PersistError> {
    fs::write(path, contents).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(name: &str, score: u32) -> Self {
        Self {
            name: name.to_string(),
            score,
        }
    }
}

/// Top-N table, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    entries: Vec<ScoreEntry>,
}

impl Default for HighScores {
    fn default() -> Self {
        Self {
            entries: vec![
                ScoreEntry::new("GEM", 5000),
                ScoreEntry::new("INI", 4000),
                ScoreEntry::new("PRO", 3000),
                ScoreEntry::new("DEV", 2000),
                ScoreEntry::new("BOT", 1000),
            ],
        }
    }
}

impl HighScores {
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Normalize a player name: up to three uppercase letters or digits,
    /// `???` when nothing usable remains.
    pub fn sanitize_name(raw: &str) -> String {
        let name: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if name.is_empty() {
            "???".to_string()
        } else {
            name
        }
    }

    /// Whether `score` earns a place in the table.
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < HIGH_SCORE_SLOTS {
            return score > 0;
        }
        self.entries.last().map_or(true, |last| score > last.score)
    }

    /// Insert a score, keeping the table sorted and truncated.
    ///
    /// Returns the 0-based rank, or `None` when the score did not qualify.
    pub fn insert(&mut self, name: &str, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries
            .insert(rank, ScoreEntry::new(&Self::sanitize_name(name), score));
        self.entries.truncate(HIGH_SCORE_SLOTS);
        Some(rank)
    }

    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(HIGH_SCORE_SLOTS);
        for entry in &mut self.entries {
            entry.name = Self::sanitize_name(&entry.name);
        }
    }

    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        let mut table: HighScores = serde_json::from_str(text)?;
        table.normalize();
        Ok(table)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        Self::from_json(&read_file(path)?)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(table) => table,
            Err(err) => {
                warn!("using default high scores: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        write_file(path, &self.to_json()?)
    }
}

/// Screen offset applied by the renderer, in terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlignmentOffsets {
    #[serde(default)]
    pub x: i16,
    #[serde(default)]
    pub y: i16,
}

fn default_enemy_order() -> Vec<HazardVariant> {
    vec![
        HazardVariant::Green,
        HazardVariant::Red,
        HazardVariant::Buzzy,
        HazardVariant::Spiny,
    ]
}

fn default_stomps_per_tier() -> u32 {
    STOMPS_PER_TIER
}

fn default_golden_chance() -> u32 {
    5
}

/// Progression settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    #[serde(default = "default_enemy_order")]
    pub enemy_order: Vec<HazardVariant>,
    #[serde(default = "default_stomps_per_tier")]
    pub stomps_per_tier: u32,
    #[serde(default = "default_golden_chance")]
    pub golden_chance_percent: u32,
    #[serde(default)]
    pub alignment_offsets: AlignmentOffsets,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            enemy_order: default_enemy_order(),
            stomps_per_tier: default_stomps_per_tier(),
            golden_chance_percent: default_golden_chance(),
            alignment_offsets: AlignmentOffsets::default(),
        }
    }
}

impl ProgressionConfig {
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.enemy_order.is_empty() {
            return Err(PersistError::Invalid("enemy_order is empty"));
        }
        if self.stomps_per_tier == 0 {
            return Err(PersistError::Invalid("stomps_per_tier must be positive"));
        }
        if self.golden_chance_percent > 100 {
            return Err(PersistError::Invalid("golden_chance_percent above 100"));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        let config: ProgressionConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self, PersistError> {
        Self::from_json(&read_file(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        self.validate()?;
        write_file(path, &self.to_json()?)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("using default progression config: {err}");
                Self::default()
            }
        }
    }
}
