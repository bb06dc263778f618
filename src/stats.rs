//! Derived battle statistics
//!
//! Pure functions over a fully materialized ledger. Count tables are ordered
//! by count descending, then id ascending, so reruns over the same ledger
//! produce identical files.

use serde::Serialize;
use std::collections::HashMap;

use crate::output::TableRow;
use crate::{Battle, PokemonId};

/// Row of the win ranking table
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WinCount {
    /// Participant id
    pub pokemon: PokemonId,
    /// Battles won
    #[serde(rename = "vitorias")]
    pub wins: u64,
}

/// Row of the total battles table
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BattleCount {
    /// Participant id
    pub pokemon: PokemonId,
    /// Battles fought on either side
    #[serde(rename = "total_batalhas")]
    pub total_battles: u64,
}

/// Row of the win rate table
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct WinRate {
    /// Participant id
    pub pokemon: PokemonId,
    /// Battles fought on either side
    #[serde(rename = "total_batalhas")]
    pub total_battles: u64,
    /// Battles won
    #[serde(rename = "vitorias")]
    pub wins: u64,
    /// `wins / total_battles * 100`
    #[serde(rename = "taxa_vitoria")]
    pub win_rate_percent: f64,
}

impl TableRow for WinCount {
    const COLUMNS: &'static [&'static str] = &["pokemon", "vitorias"];
}

impl TableRow for BattleCount {
    const COLUMNS: &'static [&'static str] = &["pokemon", "total_batalhas"];
}

impl TableRow for WinRate {
    const COLUMNS: &'static [&'static str] =
        &["pokemon", "total_batalhas", "vitorias", "taxa_vitoria"];
}

/// Battles whose winner fought on neither side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerAnomalies {
    /// Offending battles with their ledger index
    pub foreign_winners: Vec<(usize, Battle)>,
}

impl LedgerAnomalies {
    /// Whether the ledger is clean
    pub fn is_empty(&self) -> bool {
        self.foreign_winners.is_empty()
    }
}

fn ranked<I>(ids: I) -> Vec<(PokemonId, u64)>
where
    I: IntoIterator<Item = PokemonId>,
{
    let mut counts: HashMap<PokemonId, u64> = HashMap::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }

    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    rows
}

/// Count wins per winner id
pub fn win_ranking(battles: &[Battle]) -> Vec<WinCount> {
    ranked(battles.iter().map(|b| b.winner))
        .into_iter()
        .map(|(pokemon, wins)| WinCount { pokemon, wins })
        .collect()
}

/// Count participations per id across both sides
pub fn total_battles(battles: &[Battle]) -> Vec<BattleCount> {
    ranked(
        battles
            .iter()
            .flat_map(|b| [b.first_pokemon, b.second_pokemon]),
    )
    .into_iter()
    .map(|(pokemon, total_battles)| BattleCount {
        pokemon,
        total_battles,
    })
    .collect()
}

/// Left-join totals with wins
///
/// Ids without wins get `0`; a zero total yields a `0.0` rate. Rows keep the
/// order of `totals`. Winners that never appear in `totals` are not included.
pub fn win_rate(totals: &[BattleCount], ranking: &[WinCount]) -> Vec<WinRate> {
    let wins: HashMap<PokemonId, u64> = ranking.iter().map(|w| (w.pokemon, w.wins)).collect();

    totals
        .iter()
        .map(|t| {
            let wins = wins.get(&t.pokemon).copied().unwrap_or(0);
            let win_rate_percent = if t.total_battles == 0 {
                0.0
            } else {
                wins as f64 / t.total_battles as f64 * 100.0
            };
            WinRate {
                pokemon: t.pokemon,
                total_battles: t.total_battles,
                wins,
                win_rate_percent,
            }
        })
        .collect()
}

/// Find battles whose winner is not one of the participants
pub fn validate_ledger(battles: &[Battle]) -> LedgerAnomalies {
    LedgerAnomalies {
        foreign_winners: battles
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, b)| !b.winner_is_participant())
            .collect(),
    }
}

/// All derived tables for one ledger
#[derive(Debug, Clone, Default)]
pub struct BattleStats {
    /// Wins per id
    pub win_ranking: Vec<WinCount>,
    /// Participations per id
    pub total_battles: Vec<BattleCount>,
    /// Win rate per participating id
    pub win_rate: Vec<WinRate>,
}

impl BattleStats {
    /// Derive every table
    pub fn from_ledger(battles: &[Battle]) -> Self {
        let win_ranking = win_ranking(battles);
        let total_battles = total_battles(battles);
        let win_rate = win_rate(&total_battles, &win_ranking);

        Self {
            win_ranking,
            total_battles,
            win_rate,
        }
    }
}
