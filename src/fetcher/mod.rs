//! Data fetchers: transport, login, pagination and enrichment

pub mod auth;
pub mod enrich;
pub mod http;
pub mod pagination;
pub mod retry;

pub use auth::{login, AuthError, SessionToken};
pub use enrich::{ApiDetailSource, DetailSource, Enriched, Enricher};
pub use http::{ApiHttpClient, ApiResponse};
pub use pagination::{ApiPageSource, Page, PageRequest, PageSource, PageStop, Paginated, Paginator};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Connection-level failure (refused, reset, DNS, timeout)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned
        status: u16,
        /// URL requested
        url: String,
    },

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    ParseError(String),

    /// Response decoded but has the wrong shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transient failures persisted through every allowed attempt
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made, including the first
        attempts: u32,
        /// Failure seen on the final attempt
        last_error: Box<FetcherError>,
    },

    /// The HTTP client could not be constructed
    #[error("client setup failed: {0}")]
    ClientSetup(String),
}

impl FetcherError {
    /// Status code carried by this error, looking through exhausted retries
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::RetriesExhausted { last_error, .. } => last_error.status(),
            _ => None,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;
