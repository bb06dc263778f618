//! File layout of the data directory
//!
//! File names are read by the dashboard and must not change.

use std::path::{Path, PathBuf};

/// Raw battle ledger
pub const BATTLES_FILE: &str = "batalhas.csv";
/// Enriched roster
pub const ROSTER_FILE: &str = "pokemons.csv";
/// Wins per id
pub const WIN_RANKING_FILE: &str = "ranking_vitorias.csv";
/// Participations per id
pub const TOTAL_BATTLES_FILE: &str = "total_batalhas.csv";
/// Win rate per id
pub const WIN_RATE_FILE: &str = "taxa_vitoria.csv";

/// Paths of every table under one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    data_dir: PathBuf,
}

impl OutputPaths {
    /// Layout rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `batalhas.csv`
    pub fn battles(&self) -> PathBuf {
        self.data_dir.join(BATTLES_FILE)
    }

    /// `pokemons.csv`
    pub fn roster(&self) -> PathBuf {
        self.data_dir.join(ROSTER_FILE)
    }

    /// `ranking_vitorias.csv`
    pub fn win_ranking(&self) -> PathBuf {
        self.data_dir.join(WIN_RANKING_FILE)
    }

    /// `total_batalhas.csv`
    pub fn total_battles(&self) -> PathBuf {
        self.data_dir.join(TOTAL_BATTLES_FILE)
    }

    /// `taxa_vitoria.csv`
    pub fn win_rate(&self) -> PathBuf {
        self.data_dir.join(WIN_RATE_FILE)
    }
}
