//! # Battle Stats ETL Library
//!
//! Extracts the battle ledger and the roster from a paginated REST API, enriches
//! every roster entry with its detail record, and derives win ranking and win
//! rate tables that a dashboard reads from CSV.
//!
//! ## Features
//!
//! - **Resilient transport**: fixed timeouts, retry with exponential backoff on
//!   429/5xx and connection failures
//! - **Fail-fast login**: nothing runs without a bearer token
//! - **Fail-soft extraction**: a failing page stops its walk with the records
//!   collected so far, a failing detail request keeps the summary record
//! - **Pure aggregation**: ranking, participation and win rate tables
//! - **Atomic CSV output**: each table replaces its file via temp-file + rename
//!
//! ## Quick Start
//!
//! ```no_run
//! use battle_stats_etl::config::PipelineConfig;
//! use battle_stats_etl::pipeline::Pipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::from_env()?;
//! let report = Pipeline::new(config)?.run().await?;
//! println!("{} battles, {} roster entries", report.battles, report.roster);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Credentials, retry policy and run settings
//! - [`fetcher`] - HTTP transport, login, pagination and enrichment
//! - [`stats`] - Win ranking, total battles and win rate derivation
//! - [`output`] - CSV table writers
//! - [`pipeline`] - Orchestrates one full extraction run
//! - [`sprite`] - Best-effort sprite URL lookup for presentation layers

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::Serialize;
use serde_json::Value;

use crate::output::TableRow;

/// CLI command implementations
pub mod cli;

/// Lenient conversions from upstream JSON values
pub mod coerce;

/// Run configuration and credentials
pub mod config;

/// HTTP transport, authentication, pagination and enrichment
pub mod fetcher;

/// Metrics instrumentation
pub mod metrics;

/// CSV output writers
pub mod output;

/// Pipeline orchestration
pub mod pipeline;

/// Sprite URL lookup
pub mod sprite;

/// Derived battle statistics
pub mod stats;

/// Identifier of a battle participant as issued by the upstream API
pub type PokemonId = i64;

/// One recorded battle outcome
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Battle {
    /// Participant on the first side
    pub first_pokemon: PokemonId,
    /// Participant on the second side
    pub second_pokemon: PokemonId,
    /// Winning participant
    pub winner: PokemonId,
}

impl Battle {
    /// Create a battle record
    pub fn new(first_pokemon: PokemonId, second_pokemon: PokemonId, winner: PokemonId) -> Self {
        Self {
            first_pokemon,
            second_pokemon,
            winner,
        }
    }

    /// Build a battle from a raw ledger row
    ///
    /// Ids may arrive as numbers or numeric strings. Returns `None` when any of
    /// the three ids is missing or unparsable.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            first_pokemon: coerce::id(value.get("first_pokemon")?)?,
            second_pokemon: coerce::id(value.get("second_pokemon")?)?,
            winner: coerce::id(value.get("winner")?)?,
        })
    }

    /// Whether the winner is one of the two participants
    pub fn winner_is_participant(&self) -> bool {
        self.winner == self.first_pokemon || self.winner == self.second_pokemon
    }
}

/// Normalized roster entry as written to `pokemons.csv`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RosterRecord {
    /// Primary key; `None` only when upstream omitted it
    pub id: Option<PokemonId>,
    /// Display name
    pub name: String,
    /// Types joined with `/`
    pub types: String,
    /// Base hit points
    pub hp: f64,
    /// Base attack
    pub attack: f64,
    /// Base defense
    pub defense: f64,
    /// Base special attack
    pub sp_attack: f64,
    /// Base special defense
    pub sp_defense: f64,
    /// Base speed
    pub speed: f64,
    /// Generation number
    pub generation: u32,
    /// Legendary flag
    pub legendary: bool,
}

impl RosterRecord {
    /// Normalize a summary or detail payload
    ///
    /// Never fails: unparsable stats become `0`, missing text fields become
    /// empty and a missing legendary flag is `false`.
    pub fn from_value(value: &Value) -> Self {
        let stat = |key: &str| coerce::stat(value.get(key));

        Self {
            id: value.get("id").and_then(coerce::id),
            name: value
                .get("name")
                .map(coerce::text)
                .unwrap_or_default(),
            types: coerce::types(value),
            hp: stat("hp"),
            attack: stat("attack"),
            defense: stat("defense"),
            sp_attack: stat("sp_attack"),
            sp_defense: stat("sp_defense"),
            speed: stat("speed"),
            generation: coerce::stat(value.get("generation")) as u32,
            legendary: value.get("legendary").map(coerce::flag).unwrap_or(false),
        }
    }
}

impl TableRow for Battle {
    const COLUMNS: &'static [&'static str] = &["first_pokemon", "second_pokemon", "winner"];
}

impl TableRow for RosterRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "types",
        "hp",
        "attack",
        "defense",
        "sp_attack",
        "sp_defense",
        "speed",
        "generation",
        "legendary",
    ];
}
