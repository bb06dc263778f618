//! Resilient HTTP client for the upstream API
//!
//! Provides one client per pipeline run with:
//! - Fixed request and connect timeouts
//! - Retry with exponential backoff on 429/5xx and connection failures
//! - Bearer token and JSON body handling
//!
//! Statuses outside the retry set are handed back to the caller unchanged.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{RetryPolicy, TransportConfig};
use crate::fetcher::auth::SessionToken;
use crate::fetcher::retry::{extract_error_type, RetryContext};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics::{self, HttpRequestMetrics};

/// Response captured by [`ApiHttpClient`]
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    url: String,
    body: Vec<u8>,
}

impl ApiResponse {
    /// HTTP status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Requested URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-2xx response into [`FetcherError::HttpStatus`]
    pub fn error_for_status(self) -> FetcherResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetcherError::HttpStatus {
                status: self.status.as_u16(),
                url: self.url,
            })
        }
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> FetcherResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            FetcherError::ParseError(format!("Failed to deserialize {}: {}", self.url, e))
        })
    }
}

/// HTTP client shared by every component of a run
#[derive(Debug, Clone)]
pub struct ApiHttpClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiHttpClient {
    /// Build a client with the configured timeouts
    ///
    /// # Arguments
    /// * `base_url` - API root without trailing slash (e.g., "<https://api.example.com>")
    /// * `transport` - Timeouts and retry policy
    pub fn new(base_url: impl Into<String>, transport: &TransportConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(transport.connect_timeout)
            .timeout(transport.request_timeout)
            .build()
            .map_err(|e| FetcherError::ClientSetup(e.to_string()))?;

        Ok(Self::with_client(client, base_url, transport.retry.clone()))
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry,
        }
    }

    /// API root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// GET with query parameters and a bearer token
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        token: Option<&SessionToken>,
    ) -> FetcherResult<ApiResponse> {
        self.request(Method::GET, path, params, token, None::<&()>)
            .await
    }

    /// POST a JSON body without authentication
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> FetcherResult<ApiResponse> {
        self.request(Method::POST, path, &[], None, Some(body)).await
    }

    /// Issue a request, retrying transient failures
    ///
    /// Retries on:
    /// - Network errors (timeout, connection refused, reset)
    /// - Statuses in the policy's retry set (429, 500, 502, 503, 504)
    ///
    /// Only GET and POST are retried. Any other status, and every status for
    /// a method allowed a single attempt, is returned as an [`ApiResponse`]
    /// for the caller to inspect.
    ///
    /// # Errors
    /// [`FetcherError::RetriesExhausted`] when every attempt failed
    /// transiently, or the bare network error when the method allows one attempt.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        token: Option<&SessionToken>,
        body: Option<&B>,
    ) -> FetcherResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let endpoint = format!("{method} {path}");
        let max_attempts = self.retry.max_attempts(&method);
        let mut last_error = None;

        debug!("{} with {} params", endpoint, params.len());

        for attempt in 0..max_attempts {
            let request_metrics = HttpRequestMetrics::start(endpoint.clone(), attempt + 1);

            let mut builder = self.client.request(method.clone(), &url).query(params);
            if let Some(token) = token {
                builder = builder.bearer_auth(token.expose());
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let (error, error_type) = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    request_metrics.record_complete(status.as_u16());

                    if max_attempts > 1 && self.retry.is_retryable_status(status) {
                        (
                            FetcherError::HttpStatus {
                                status: status.as_u16(),
                                url: url.clone(),
                            },
                            extract_error_type(Some(status), None),
                        )
                    } else {
                        match response.bytes().await {
                            Ok(bytes) => {
                                if attempt > 0 {
                                    let ctx = RetryContext::new(
                                        attempt + 1,
                                        max_attempts,
                                        extract_error_type(Some(status), None),
                                        std::time::Duration::ZERO,
                                        endpoint.as_str(),
                                        "",
                                    );
                                    info!("{}", ctx.format_success());
                                }
                                return Ok(ApiResponse {
                                    status,
                                    url,
                                    body: bytes.to_vec(),
                                });
                            }
                            Err(e) => {
                                let error_type = extract_error_type(None, Some(&e));
                                (FetcherError::NetworkError(e.to_string()), error_type)
                            }
                        }
                    }
                }
                Err(e) => {
                    request_metrics.record_failure();
                    if e.is_builder() {
                        return Err(FetcherError::ClientSetup(e.to_string()));
                    }
                    let error_type = extract_error_type(None, Some(&e));
                    (FetcherError::NetworkError(e.to_string()), error_type)
                }
            };

            let backoff = self.retry.backoff(attempt);
            let ctx = RetryContext::new(
                attempt + 1,
                max_attempts,
                error_type,
                backoff,
                endpoint.as_str(),
                error.to_string(),
            );
            last_error = Some(error);

            if attempt + 1 < max_attempts {
                warn!("{}", ctx.format_retry());
                metrics::record_retry(&endpoint, backoff);
                tokio::time::sleep(backoff).await;
            } else if max_attempts > 1 {
                warn!("{}", ctx.format_failure());
            }
        }

        let last_error = last_error.unwrap_or_else(|| {
            FetcherError::NetworkError("no attempt was made".to_string())
        });

        if max_attempts > 1 {
            Err(FetcherError::RetriesExhausted {
                attempts: max_attempts,
                last_error: Box::new(last_error),
            })
        } else {
            Err(last_error)
        }
    }
}
