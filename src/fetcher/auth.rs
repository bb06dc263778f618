//! Login against the upstream API
//!
//! Authentication is the one fail-fast step of a run: without a token no
//! other endpoint can be read, so every failure here is fatal to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info};

use crate::config::Credentials;
use crate::fetcher::http::ApiHttpClient;
use crate::fetcher::FetcherError;

/// Login endpoint path
pub const LOGIN_PATH: &str = "/login";

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Login could not be sent or kept failing transiently
    #[error("login request failed: {0}")]
    Transport(#[from] FetcherError),

    /// Server answered with a non-2xx status
    #[error("login rejected with HTTP {status}")]
    Rejected {
        /// Status code returned
        status: u16,
    },

    /// Response carried no usable token
    #[error("login response has no access_token")]
    MissingToken,
}

/// Bearer token held in memory for one run
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

/// Exchange credentials for a bearer token
///
/// Sends one `POST /login` with `{username, password}`; the transport may
/// retry it on transient failures.
///
/// # Errors
/// Any transport failure, non-2xx status, or missing token.
pub async fn login(client: &ApiHttpClient, credentials: &Credentials) -> Result<SessionToken, AuthError> {
    info!("Authenticating as {}", credentials.username());

    let body = LoginRequest {
        username: credentials.username(),
        password: credentials.password(),
    };

    let response = client.post_json(LOGIN_PATH, &body).await.map_err(|e| {
        error!("Login failed: {}", e);
        AuthError::Transport(e)
    })?;

    if !response.is_success() {
        error!("Login rejected with HTTP {}", response.status());
        return Err(AuthError::Rejected {
            status: response.status().as_u16(),
        });
    }

    let parsed: LoginResponse = response.json().map_err(|e| {
        error!("Login response unreadable: {}", e);
        AuthError::Transport(e)
    })?;

    match parsed.access_token.filter(|t| !t.trim().is_empty()) {
        Some(token) => {
            info!("Login succeeded");
            Ok(SessionToken::new(token))
        }
        None => {
            error!("Login response has no access_token");
            Err(AuthError::MissingToken)
        }
    }
}
