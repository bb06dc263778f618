//! One full extraction run
//!
//! Login, battle ledger, roster with enrichment, then the derived tables.
//! Steps run one after another on the calling task.

use indicatif::ProgressBar;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::fetcher::{
    login, ApiDetailSource, ApiHttpClient, ApiPageSource, AuthError, Enricher, FetcherError,
    PageStop, Paginator,
};
use crate::output::{write_table, OutputError, OutputPaths};
use crate::stats::{validate_ledger, BattleStats};
use crate::{Battle, RosterRecord};

/// Battle ledger endpoint
pub const COMBATS_PATH: &str = "/combats";
/// Key holding ledger rows
pub const COMBATS_KEY: &str = "combats";
/// Roster listing endpoint
pub const ROSTER_PATH: &str = "/pokemon";
/// Key holding roster rows
pub const ROSTER_KEY: &str = "pokemons";

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Settings are missing or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login failed
    #[error("authentication error: {0}")]
    Authentication(#[from] AuthError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] FetcherError),

    /// A table could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Ledger rows kept
    pub battles: usize,
    /// Ledger rows dropped for missing or unparsable ids
    pub dropped_battles: usize,
    /// Why the ledger walk ended
    pub battles_stop: PageStop,
    /// Roster records written
    pub roster: usize,
    /// Why the roster walk ended
    pub roster_stop: PageStop,
    /// Roster records that kept their summary payload
    pub enrich_fallbacks: usize,
    /// Battles whose winner fought on neither side
    pub foreign_winners: usize,
    /// Files written, in order
    pub files: Vec<PathBuf>,
}

impl PipelineReport {
    /// Whether any walk stopped early
    pub fn is_partial(&self) -> bool {
        self.battles_stop.is_partial() || self.roster_stop.is_partial()
    }
}

/// Pipeline bound to one configuration and one HTTP client
pub struct Pipeline {
    config: PipelineConfig,
    client: ApiHttpClient,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    /// Validate `config` and build the run's HTTP client
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let client = ApiHttpClient::new(config.credentials.base_url(), &config.transport)?;
        Ok(Self::with_client(config, client))
    }

    /// Use an already configured client
    pub fn with_client(config: PipelineConfig, client: ApiHttpClient) -> Self {
        Self {
            config,
            client,
            progress: None,
        }
    }

    /// Show enrichment progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the run
    ///
    /// # Errors
    /// Login failure or a table that cannot be written. Fetch and enrichment
    /// failures only shrink the data and show up in the report.
    pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
        let token = login(&self.client, &self.config.credentials).await?;
        let paths = OutputPaths::new(&self.config.data_dir);
        let pages = ApiPageSource::new(&self.client, &token);
        let mut files = Vec::new();

        // Battles
        let combats = self
            .paginator(self.config.battles_page_size)
            .fetch_all(&pages, COMBATS_PATH, COMBATS_KEY)
            .await;
        let (ledger, dropped_battles) = parse_ledger(&combats.records);
        if dropped_battles > 0 {
            warn!("Dropped {} ledger rows with missing ids", dropped_battles);
        }
        // Every table is rewritten, even when empty, so no file outlives its run
        write_table(paths.battles(), &ledger)?;
        files.push(paths.battles());

        // Roster
        let listing = self
            .paginator(self.config.roster_page_size)
            .fetch_all(&pages, ROSTER_PATH, ROSTER_KEY)
            .await;
        let mut roster = Vec::new();
        let mut enrich_fallbacks = 0;
        if !listing.records.is_empty() {
            let mut enricher = Enricher::new().with_concurrency(self.config.enrich_concurrency);
            if let Some(pb) = &self.progress {
                enricher = enricher.with_progress(pb.clone());
            }
            let enriched = enricher
                .enrich(&ApiDetailSource::new(&self.client, &token), listing.records)
                .await;
            enrich_fallbacks = enriched.fallbacks;
            roster = enriched
                .records
                .iter()
                .map(RosterRecord::from_value)
                .collect::<Vec<_>>();
        }
        write_table(paths.roster(), &roster)?;
        files.push(paths.roster());

        // Derived tables
        info!("Calculating win ranking and win rate tables");
        let anomalies = validate_ledger(&ledger);
        let foreign_winners = anomalies.foreign_winners.len();
        if !anomalies.is_empty() {
            warn!(
                "{} battles name a winner that did not take part; counted as recorded",
                foreign_winners
            );
        }

        let stats = BattleStats::from_ledger(&ledger);
        write_table(paths.win_ranking(), &stats.win_ranking)?;
        write_table(paths.total_battles(), &stats.total_battles)?;
        write_table(paths.win_rate(), &stats.win_rate)?;
        files.extend([paths.win_ranking(), paths.total_battles(), paths.win_rate()]);

        let report = PipelineReport {
            battles: ledger.len(),
            dropped_battles,
            battles_stop: combats.stop,
            roster: roster.len(),
            roster_stop: listing.stop,
            enrich_fallbacks,
            foreign_winners,
            files,
        };

        if report.is_partial() {
            warn!(
                "Run finished with partial data; files saved in '{}'",
                self.config.data_dir.display()
            );
        } else {
            info!("Run finished; files saved in '{}'", self.config.data_dir.display());
        }

        Ok(report)
    }

    fn paginator(&self, page_size: u32) -> Paginator {
        Paginator::new(page_size).with_total_policy(self.config.total_policy)
    }
}

/// Parse raw ledger rows, returning the battles and the number dropped
pub fn parse_ledger(rows: &[Value]) -> (Vec<Battle>, usize) {
    let battles: Vec<Battle> = rows.iter().filter_map(Battle::from_value).collect();
    let dropped = rows.len() - battles.len();
    (battles, dropped)
}
