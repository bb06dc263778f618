//! Page-number pagination over collection endpoints
//!
//! Walks `?page=N&per_page=M` from page 1 until one of the stop conditions
//! holds, first match wins:
//! 1. the page is empty
//! 2. the accumulated count reached the reported `total` (when trusted)
//! 3. the page is shorter than `per_page`
//!
//! A failing page ends the walk early and keeps what was collected.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::TotalPolicy;
use crate::fetcher::auth::SessionToken;
use crate::fetcher::http::ApiHttpClient;
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics;

/// Maximum number of pages walked to prevent infinite loops
pub const MAX_PAGES: u32 = 100_000;

/// Log progress every N pages
const PROGRESS_EVERY_PAGES: u32 = 5;

/// One page request
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    /// Endpoint path, e.g. `/combats`
    pub endpoint: &'a str,
    /// Key holding the records in the response object
    pub response_key: &'a str,
    /// 1-based page number
    pub page: u32,
    /// Requested page size
    pub per_page: u32,
}

impl PageRequest<'_> {
    /// Query parameters for this page
    pub fn params(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}

/// Records and reported total from one page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records on this page
    pub records: Vec<Value>,
    /// Collection size reported by the server
    pub total: Option<u64>,
}

impl Page {
    /// Build a page
    pub fn new(records: Vec<Value>, total: Option<u64>) -> Self {
        Self { records, total }
    }

    /// Extract a page from a response object
    ///
    /// A missing `response_key` is an empty page. A non-array value under it,
    /// or a body that is not an object, is an invalid response.
    pub fn from_body(body: Value, response_key: &str) -> FetcherResult<Self> {
        let Value::Object(mut map) = body else {
            return Err(FetcherError::InvalidResponse(
                "expected a JSON object".to_string(),
            ));
        };

        let records = match map.remove(response_key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(FetcherError::InvalidResponse(format!(
                    "'{response_key}' is not an array: {other}"
                )))
            }
        };

        let total = map.get("total").and_then(|t| {
            t.as_u64()
                .or_else(|| t.as_f64().and_then(integral_count))
                .or_else(|| t.as_str().and_then(|s| s.trim().parse().ok()))
        });

        Ok(Self { records, total })
    }
}

/// A float total counts only when it is a whole, non-negative number
fn integral_count(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64)
        .then_some(value as u64)
}

/// Source of pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch one page
    async fn fetch_page(&self, request: PageRequest<'_>) -> FetcherResult<Page>;
}

/// Page source backed by the HTTP client and a session token
pub struct ApiPageSource<'a> {
    client: &'a ApiHttpClient,
    token: &'a SessionToken,
}

impl<'a> ApiPageSource<'a> {
    /// Create a page source
    pub fn new(client: &'a ApiHttpClient, token: &'a SessionToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl PageSource for ApiPageSource<'_> {
    async fn fetch_page(&self, request: PageRequest<'_>) -> FetcherResult<Page> {
        let response = self
            .client
            .get(request.endpoint, &request.params(), Some(self.token))
            .await?
            .error_for_status()?;

        Page::from_body(response.json()?, request.response_key)
    }
}

/// Why a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStop {
    /// A page came back empty
    EmptyPage,
    /// Accumulated records reached the reported total
    ReachedTotal(u64),
    /// A page was shorter than requested
    ShortPage,
    /// A page failed; records from earlier pages are kept
    Failed {
        /// Page that failed
        page: u32,
        /// Failure description
        error: String,
    },
    /// The page ceiling was hit
    PageLimit,
}

impl PageStop {
    /// Whether the walk ended before reaching the end of the collection
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::PageLimit)
    }
}

/// Result of walking a collection
#[derive(Debug, Clone)]
pub struct Paginated {
    /// Records in page order
    pub records: Vec<Value>,
    /// Pages that returned successfully
    pub pages: u32,
    /// Why the walk ended
    pub stop: PageStop,
}

/// Walks a collection to completion
#[derive(Debug, Clone)]
pub struct Paginator {
    page_size: u32,
    total_policy: TotalPolicy,
    max_pages: u32,
}

impl Paginator {
    /// Create a paginator
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            total_policy: TotalPolicy::default(),
            max_pages: MAX_PAGES,
        }
    }

    /// Choose how the reported total is used
    pub fn with_total_policy(mut self, policy: TotalPolicy) -> Self {
        self.total_policy = policy;
        self
    }

    /// Override the page ceiling
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Requested page size
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch every page of `endpoint`
    ///
    /// Never fails: a failing page ends the walk with [`PageStop::Failed`]
    /// and the records gathered from earlier pages.
    pub async fn fetch_all<S>(&self, source: &S, endpoint: &str, response_key: &str) -> Paginated
    where
        S: PageSource + ?Sized,
    {
        let mut records: Vec<Value> = Vec::new();
        let mut page = 1;

        info!("Fetching {}", endpoint);

        let stop = loop {
            if page > self.max_pages {
                warn!(
                    "Max pages ({}) reached for {} - possible infinite loop. Records: {}",
                    self.max_pages,
                    endpoint,
                    records.len()
                );
                break PageStop::PageLimit;
            }

            let request = PageRequest {
                endpoint,
                response_key,
                page,
                per_page: self.page_size,
            };

            let batch = match source.fetch_page(request).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Page {} of {} failed: {}", page, endpoint, e);
                    break PageStop::Failed {
                        page,
                        error: e.to_string(),
                    };
                }
            };

            if batch.records.is_empty() {
                debug!("Empty page {} of {}", page, endpoint);
                break PageStop::EmptyPage;
            }

            let received = batch.records.len();
            records.extend(batch.records);
            metrics::record_page(endpoint, received);

            debug!("Received {} records in page {}", received, page);
            if page % PROGRESS_EVERY_PAGES == 0 {
                info!("  -> page {} | accumulated: {}", page, records.len());
            }

            if self.total_policy == TotalPolicy::Trust {
                if let Some(total) = batch.total.filter(|t| *t > 0) {
                    if records.len() as u64 >= total {
                        break PageStop::ReachedTotal(total);
                    }
                }
            }

            if received < self.page_size as usize {
                break PageStop::ShortPage;
            }

            page += 1;
        };

        let pages = match &stop {
            PageStop::Failed { page, .. } => page - 1,
            PageStop::EmptyPage => page - 1,
            PageStop::PageLimit => self.max_pages,
            PageStop::ReachedTotal(_) | PageStop::ShortPage => page,
        };

        if stop.is_partial() {
            warn!(
                "{} incomplete: {} records from {} pages ({:?})",
                endpoint,
                records.len(),
                pages,
                stop
            );
        } else {
            info!("{} complete. Total: {}", endpoint, records.len());
        }

        Paginated {
            records,
            pages,
            stop,
        }
    }
}

/// Fetch every record of `endpoint` with the bearer token attached
pub async fn fetch_all(
    client: &ApiHttpClient,
    token: &SessionToken,
    endpoint: &str,
    response_key: &str,
    page_size: u32,
) -> Paginated {
    Paginator::new(page_size)
        .fetch_all(&ApiPageSource::new(client, token), endpoint, response_key)
        .await
}
