//! Run configuration: credentials, retry policy and pipeline settings
//!
//! Credentials come from the environment (optionally seeded from a `.env`
//! file by the binary). Everything else has a default that the CLI can
//! override.

use reqwest::{Method, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API base URL
pub const ENV_BASE_URL: &str = "API_BASE_URL";
/// Environment variable holding the login username
pub const ENV_USERNAME: &str = "API_USERNAME";
/// Environment variable holding the login password
pub const ENV_PASSWORD: &str = "API_PASSWORD";
/// Optional environment variable overriding the output directory
pub const ENV_DATA_DIR: &str = "ETL_DATA_DIR";

/// Overall request timeout (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 15;
/// TCP connect timeout (seconds)
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of retries after the first attempt.
/// With a 1s factor the waits are 1, 2, 4, 8, 16 seconds (~31s in total).
pub const MAX_RETRIES: u32 = 5;

/// Backoff factor in milliseconds; retry `n` waits `factor * 2^n`
pub const BACKOFF_FACTOR_MS: u64 = 1000;

/// Upper bound for a single backoff wait in milliseconds
pub const MAX_BACKOFF_MS: u64 = 120_000;

/// Status codes treated as transient
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Page size for the battle ledger
pub const BATTLES_PAGE_SIZE: u32 = 100;
/// Page size for the roster listing
pub const ROSTER_PAGE_SIZE: u32 = 50;

/// Default output directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Calculate exponential backoff delay for a 0-based retry number
pub fn calculate_backoff(factor: Duration, retry: u32, cap: Duration) -> Duration {
    let multiplier = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
    factor.saturating_mul(multiplier).min(cap)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required value is absent or empty
    #[error("missing required setting {0}; set it in the environment or in .env")]
    Missing(&'static str),

    /// A value is present but unusable
    #[error("invalid setting {name}: {reason}")]
    Invalid {
        /// Setting name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// API credentials supplied externally
#[derive(Clone)]
pub struct Credentials {
    base_url: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Validate and build credentials
    ///
    /// Every field must be non-empty after trimming. A trailing `/` on the
    /// base URL is dropped so endpoint paths can be appended directly.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let username = username.into().trim().to_string();
        let password = password.into();

        if base_url.is_empty() {
            return Err(ConfigError::Missing(ENV_BASE_URL));
        }
        if username.is_empty() {
            return Err(ConfigError::Missing(ENV_USERNAME));
        }
        if password.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_PASSWORD));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: ENV_BASE_URL,
                reason: format!("'{base_url}' is not an http(s) URL"),
            });
        }

        Ok(Self {
            base_url,
            username,
            password,
        })
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        let username = lookup(ENV_USERNAME).ok_or(ConfigError::Missing(ENV_USERNAME))?;
        let password = lookup(ENV_PASSWORD).ok_or(ConfigError::Missing(ENV_PASSWORD))?;
        Self::new(base_url, username, password)
    }

    /// API base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Login username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Retry policy for the HTTP transport
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff; retry `n` waits `backoff_factor * 2^n`
    pub backoff_factor: Duration,
    /// Cap for a single wait
    pub max_backoff: Duration,
    /// Status codes that trigger a retry
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            backoff_factor: Duration::from_millis(BACKOFF_FACTOR_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            retry_statuses: RETRY_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before the 0-based retry `retry`
    pub fn backoff(&self, retry: u32) -> Duration {
        calculate_backoff(self.backoff_factor, retry, self.max_backoff)
    }

    /// Whether the status belongs to the transient set
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Only GET and POST are retried
    pub fn allows_method(&self, method: &Method) -> bool {
        *method == Method::GET || *method == Method::POST
    }

    /// Total attempts allowed for a method
    pub fn max_attempts(&self, method: &Method) -> u32 {
        if self.allows_method(method) {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }
}

/// Transport timeouts and retry behaviour
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Retry policy
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// How the paginated fetcher treats the upstream `total` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalPolicy {
    /// Stop once the accumulated count reaches `total`
    #[default]
    Trust,
    /// Ignore `total`; stop only on an empty or short page
    Ignore,
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// API credentials
    pub credentials: Credentials,
    /// Directory receiving the CSV tables
    pub data_dir: PathBuf,
    /// Transport settings
    pub transport: TransportConfig,
    /// Page size for `/combats`
    pub battles_page_size: u32,
    /// Page size for `/pokemon`
    pub roster_page_size: u32,
    /// Treatment of upstream `total`
    pub total_policy: TotalPolicy,
    /// Detail requests in flight at once (1 = sequential)
    pub enrich_concurrency: usize,
}

impl PipelineConfig {
    /// Default settings around the given credentials
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            transport: TransportConfig::default(),
            battles_page_size: BATTLES_PAGE_SIZE,
            roster_page_size: ROSTER_PAGE_SIZE,
            total_policy: TotalPolicy::default(),
            enrich_concurrency: 1,
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::from_lookup(&lookup)?;
        let mut config = Self::new(credentials);

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Reject settings that would make the run meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.battles_page_size == 0 || self.roster_page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "page_size",
                reason: "page size must be at least 1".to_string(),
            });
        }
        if self.enrich_concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "enrich_concurrency",
                reason: "concurrency must be at least 1".to_string(),
            });
        }
        if self.transport.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "request_timeout",
                reason: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}
