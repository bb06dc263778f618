//! Per-record enrichment of roster summaries
//!
//! Each summary is replaced by its detail payload from `/pokemon/{id}`. A
//! failed lookup keeps the summary as-is; output order and length always
//! match the input.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use serde_json::Value;
use tracing::{debug, info};

use crate::coerce;
use crate::fetcher::auth::SessionToken;
use crate::fetcher::http::ApiHttpClient;
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics;
use crate::PokemonId;

/// Detail endpoint prefix
pub const DETAIL_PATH: &str = "/pokemon";

/// Log progress every N records
const PROGRESS_EVERY_RECORDS: usize = 50;

/// Source of detail records
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Fetch the detail payload for one id
    async fn fetch_detail(&self, id: PokemonId) -> FetcherResult<Value>;
}

/// Detail source backed by the HTTP client and a session token
pub struct ApiDetailSource<'a> {
    client: &'a ApiHttpClient,
    token: &'a SessionToken,
}

impl<'a> ApiDetailSource<'a> {
    /// Create a detail source
    pub fn new(client: &'a ApiHttpClient, token: &'a SessionToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl DetailSource for ApiDetailSource<'_> {
    async fn fetch_detail(&self, id: PokemonId) -> FetcherResult<Value> {
        let path = format!("{DETAIL_PATH}/{id}");
        let detail: Value = self
            .client
            .get(&path, &[], Some(self.token))
            .await?
            .error_for_status()?
            .json()?;

        if detail.is_object() {
            Ok(detail)
        } else {
            Err(FetcherError::InvalidResponse(format!(
                "{path} did not return an object"
            )))
        }
    }
}

/// Enrichment output
#[derive(Debug, Clone)]
pub struct Enriched {
    /// Records in input order
    pub records: Vec<Value>,
    /// How many records kept their summary payload
    pub fallbacks: usize,
}

/// Replaces summaries with detail payloads
#[derive(Clone)]
pub struct Enricher {
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

impl Enricher {
    /// Sequential enricher
    pub fn new() -> Self {
        Self {
            concurrency: 1,
            progress: None,
        }
    }

    /// Allow up to `concurrency` detail requests in flight
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Advance `progress` once per record
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Enrich every record
    ///
    /// Records without a parsable `id` are kept without a request.
    pub async fn enrich<S>(&self, source: &S, records: Vec<Value>) -> Enriched
    where
        S: DetailSource + ?Sized,
    {
        let total = records.len();
        info!("Enriching {} roster records", total);

        if let Some(pb) = &self.progress {
            pb.set_length(total as u64);
        }

        let results: Vec<(Value, bool)> = stream::iter(records.into_iter().enumerate())
            .map(|(index, summary)| async move {
                let outcome = enrich_one(source, summary).await;

                if (index + 1) % PROGRESS_EVERY_RECORDS == 0 {
                    info!("  processed: {}/{}", index + 1, total);
                }
                if let Some(pb) = &self.progress {
                    pb.inc(1);
                }
                outcome
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        let fallbacks = results.iter().filter(|(_, fell_back)| *fell_back).count();
        if fallbacks > 0 {
            info!("Enrichment done: {} of {} kept summary data", fallbacks, total);
        } else {
            info!("Enrichment done: {} records", total);
        }

        Enriched {
            records: results.into_iter().map(|(record, _)| record).collect(),
            fallbacks,
        }
    }
}

/// Returns the record to keep and whether it fell back to the summary
async fn enrich_one<S>(source: &S, summary: Value) -> (Value, bool)
where
    S: DetailSource + ?Sized,
{
    let Some(id) = summary.get("id").and_then(coerce::id) else {
        debug!("Roster record without id kept as-is");
        metrics::record_enrich_fallback();
        return (summary, true);
    };

    match source.fetch_detail(id).await {
        Ok(detail) => (detail, false),
        Err(e) => {
            debug!("Detail for {} unavailable, keeping summary: {}", id, e);
            metrics::record_enrich_fallback();
            (summary, true)
        }
    }
}

/// Enrich `records` sequentially through the HTTP client
pub async fn enrich(client: &ApiHttpClient, token: &SessionToken, records: Vec<Value>) -> Enriched {
    Enricher::new()
        .enrich(&ApiDetailSource::new(client, token), records)
        .await
}
