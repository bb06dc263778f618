//! In-process fake of the upstream API for integration tests

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use battle_stats_etl::config::{RetryPolicy, TransportConfig};
use battle_stats_etl::fetcher::ApiHttpClient;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Token issued by the fake login
pub const TOKEN: &str = "test-token";

/// Bind `router` on an ephemeral port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Retry policy with millisecond backoff so tests stay fast
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        backoff_factor: Duration::from_millis(1),
        max_backoff: Duration::from_millis(10),
        ..RetryPolicy::default()
    }
}

/// Transport settings for tests
pub fn fast_transport(max_retries: u32) -> TransportConfig {
    TransportConfig {
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        retry: fast_retry(max_retries),
    }
}

/// HTTP client against `base_url` with fast retries
pub fn test_client(base_url: &str, max_retries: u32) -> ApiHttpClient {
    ApiHttpClient::new(base_url, &fast_transport(max_retries)).unwrap()
}

/// Behaviour of the fake API
#[derive(Default)]
pub struct FakeApiSpec {
    /// Ledger rows served by `/combats`
    pub battles: Vec<Value>,
    /// Summary rows served by `/pokemon`
    pub roster: Vec<Value>,
    /// Detail ids answering 404
    pub missing_details: HashSet<i64>,
    /// Detail ids answering 500
    pub broken_details: HashSet<i64>,
    /// Status returned by `/login` instead of a token
    pub login_status: Option<StatusCode>,
    /// Combats page answering 500
    pub broken_combats_page: Option<usize>,
}

/// Shared state: the spec and a log of every request
#[derive(Clone)]
pub struct FakeApi {
    spec: Arc<FakeApiSpec>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeApi {
    /// Wrap a spec
    pub fn new(spec: FakeApiSpec) -> Self {
        Self {
            spec: Arc::new(spec),
            hits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start serving and return the base URL
    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/login", post(login))
            .route("/combats", get(combats))
            .route("/pokemon", get(roster))
            .route("/pokemon/:id", get(detail))
            .with_state(self.clone());
        serve(router).await
    }

    /// Requests received so far, as "METHOD /path?page=N"
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Requests whose description starts with `prefix`
    pub fn hits_matching(&self, prefix: &str) -> usize {
        self.hits().iter().filter(|h| h.starts_with(prefix)).count()
    }

    fn record(&self, hit: String) {
        self.hits.lock().unwrap().push(hit);
    }
}

/// Detail payload the fake returns for `id`
pub fn detail_payload(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Mon{id}"),
        "types": ["normal"],
        "hp": 40 + id,
        "attack": "55",
        "defense": 50,
        "sp_attack": 45,
        "sp_defense": "n/a",
        "speed": 60,
        "generation": 1,
        "legendary": id == 150,
    })
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn page_of(rows: &[Value], params: &HashMap<String, String>) -> (usize, Vec<Value>) {
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10);
    let start = (page.saturating_sub(1) * per_page).min(rows.len());
    let end = (start + per_page).min(rows.len());
    (page, rows[start..end].to_vec())
}

async fn login(State(api): State<FakeApi>, Json(body): Json<Value>) -> Response {
    api.record("POST /login".to_string());

    if let Some(status) = api.spec.login_status {
        return (status, Json(json!({"detail": "denied"}))).into_response();
    }
    if body.get("username").is_none() || body.get("password").is_none() {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    }
    Json(json!({"access_token": TOKEN})).into_response()
}

async fn combats(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (page, rows) = page_of(&api.spec.battles, &params);
    api.record(format!("GET /combats?page={page}"));

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if api.spec.broken_combats_page == Some(page) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({"combats": rows, "total": api.spec.battles.len()})).into_response()
}

async fn roster(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (page, rows) = page_of(&api.spec.roster, &params);
    api.record(format!("GET /pokemon?page={page}"));

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"pokemons": rows, "total": api.spec.roster.len()})).into_response()
}

async fn detail(State(api): State<FakeApi>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    api.record(format!("GET /pokemon/{id}"));

    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if api.spec.missing_details.contains(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if api.spec.broken_details.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(detail_payload(id)).into_response()
}
