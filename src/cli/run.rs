//! `run` command: execute the full pipeline

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{PipelineConfig, TotalPolicy, BATTLES_PAGE_SIZE, MAX_RETRIES, REQUEST_TIMEOUT_SECS, ROSTER_PAGE_SIZE};
use crate::pipeline::{Pipeline, PipelineReport};

use super::CliError;

/// Maximum allowed enrichment concurrency
const MAX_CONCURRENCY: usize = 32;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Arguments for the `run` command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory receiving the CSV tables (default: $ETL_DATA_DIR or "data")
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Maximum number of retries for transient failures (range: 0-20)
    #[arg(long, default_value_t = MAX_RETRIES, value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// Page size for the battle ledger
    #[arg(long, default_value_t = BATTLES_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub battles_page_size: u32,

    /// Page size for the roster listing
    #[arg(long, default_value_t = ROSTER_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub roster_page_size: u32,

    /// Detail requests in flight during enrichment (default: 1, max: 32)
    #[arg(long, default_value = "1", value_parser = parse_concurrency)]
    pub enrich_concurrency: usize,

    /// Ignore the server-reported total and stop only on an empty or short page
    #[arg(long, default_value_t = false)]
    pub ignore_total: bool,

    /// Expose Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,

    /// Disable the enrichment progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl RunArgs {
    /// Build the pipeline configuration from the environment and flags
    pub fn config(&self) -> Result<PipelineConfig, CliError> {
        let mut config = PipelineConfig::from_env()?;

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config.transport.retry.max_retries = self.max_retries;
        config.transport.request_timeout = Duration::from_secs(self.timeout_secs);
        config.battles_page_size = self.battles_page_size;
        config.roster_page_size = self.roster_page_size;
        config.enrich_concurrency = self.enrich_concurrency;
        if self.ignore_total {
            config.total_policy = TotalPolicy::Ignore;
        }

        config.validate()?;
        Ok(config)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<PipelineReport, CliError> {
        let config = self.config()?;

        if let Some(addr) = self.metrics_addr {
            if let Err(e) = crate::metrics::init_metrics(addr) {
                warn!("Metrics disabled: {}", e);
            }
        }

        let mut pipeline = Pipeline::new(config)?;
        if !self.no_progress {
            pipeline = pipeline.with_progress(create_progress_bar());
        }

        let report = pipeline.run().await?;

        info!(
            battles = report.battles,
            roster = report.roster,
            enrich_fallbacks = report.enrich_fallbacks,
            files = report.files.len(),
            partial = report.is_partial(),
            "Pipeline complete"
        );

        Ok(report)
    }
}

/// Create the enrichment progress bar
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message("Enriching roster");
    pb
}
