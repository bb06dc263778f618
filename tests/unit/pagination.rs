//! Unit tests for the paginated fetcher

use async_trait::async_trait;
use battle_stats_etl::config::TotalPolicy;
use battle_stats_etl::fetcher::{
    FetcherError, FetcherResult, Page, PageRequest, PageSource, PageStop, Paginator,
};
use serde_json::{json, Value};
use std::sync::Mutex;

/// Serves pages from a script and records every requested page number
struct ScriptedSource {
    pages: Vec<FetcherResult<Page>>,
    requested: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedSource {
    fn new(pages: Vec<FetcherResult<Page>>) -> Self {
        Self {
            pages,
            requested: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    fn requested(&self) -> Vec<(u32, u32)> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, request: PageRequest<'_>) -> FetcherResult<Page> {
        self.requested
            .lock()
            .unwrap()
            .push((request.page, request.per_page));

        match self.pages.get(request.page as usize - 1) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(e)) => Err(FetcherError::InvalidResponse(e.to_string())),
            None => Ok(Page::default()),
        }
    }
}

fn records(range: std::ops::Range<i64>) -> Vec<Value> {
    range.map(|i| json!({"id": i})).collect()
}

fn page(range: std::ops::Range<i64>, total: Option<u64>) -> FetcherResult<Page> {
    Ok(Page::new(records(range), total))
}

fn ids(values: &[Value]) -> Vec<i64> {
    values.iter().map(|v| v["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn test_stops_when_total_reached() {
    let source = ScriptedSource::new(vec![
        page(0..2, Some(5)),
        page(2..4, Some(5)),
        page(4..6, Some(5)),
        page(6..8, Some(5)),
    ]);

    let result = Paginator::new(2).fetch_all(&source, "/combats", "combats").await;

    // 6 >= 5 after the third page; the fourth is never requested
    assert_eq!(source.calls(), 3);
    assert_eq!(result.stop, PageStop::ReachedTotal(5));
    assert_eq!(result.pages, 3);
    assert_eq!(ids(&result.records), vec![0, 1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_stops_on_short_page() {
    let source = ScriptedSource::new(vec![page(0..3, None), page(3..5, None)]);

    let result = Paginator::new(3).fetch_all(&source, "/pokemon", "pokemons").await;

    assert_eq!(source.calls(), 2);
    assert_eq!(result.stop, PageStop::ShortPage);
    assert_eq!(result.records.len(), 5);
}

#[tokio::test]
async fn test_stops_on_empty_page() {
    let source = ScriptedSource::new(vec![page(0..2, None), page(2..4, None)]);

    let result = Paginator::new(2).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(source.calls(), 3);
    assert_eq!(result.stop, PageStop::EmptyPage);
    assert_eq!(result.pages, 2);
    assert_eq!(result.records.len(), 4);
}

#[tokio::test]
async fn test_empty_first_page_yields_nothing() {
    let source = ScriptedSource::new(vec![page(0..0, Some(0))]);

    let result = Paginator::new(10).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(source.calls(), 1);
    assert!(result.records.is_empty());
    assert_eq!(result.pages, 0);
    assert!(!result.stop.is_partial());
}

#[tokio::test]
async fn test_failure_keeps_earlier_pages() {
    let source = ScriptedSource::new(vec![
        page(0..2, Some(10)),
        page(2..4, Some(10)),
        Err(FetcherError::HttpStatus {
            status: 500,
            url: "http://api/combats".to_string(),
        }),
        page(6..8, Some(10)),
    ]);

    let result = Paginator::new(2).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(source.calls(), 3);
    assert_eq!(ids(&result.records), vec![0, 1, 2, 3]);
    assert_eq!(result.pages, 2);
    assert!(matches!(result.stop, PageStop::Failed { page: 3, .. }));
    assert!(result.stop.is_partial());
}

#[tokio::test]
async fn test_failure_on_first_page_is_empty_partial() {
    let source = ScriptedSource::new(vec![Err(FetcherError::NetworkError(
        "connection refused".to_string(),
    ))]);

    let result = Paginator::new(2).fetch_all(&source, "/pokemon", "pokemons").await;

    assert!(result.records.is_empty());
    assert_eq!(result.pages, 0);
    assert!(result.stop.is_partial());
}

#[tokio::test]
async fn test_ignored_total_keeps_walking() {
    // Server claims 2 records but actually has more
    let source = ScriptedSource::new(vec![
        page(0..2, Some(2)),
        page(2..4, Some(2)),
        page(4..5, Some(2)),
    ]);

    let result = Paginator::new(2)
        .with_total_policy(TotalPolicy::Ignore)
        .fetch_all(&source, "/combats", "combats")
        .await;

    assert_eq!(source.calls(), 3);
    assert_eq!(result.records.len(), 5);
    assert_eq!(result.stop, PageStop::ShortPage);
}

#[tokio::test]
async fn test_stale_total_truncates_when_trusted() {
    let source = ScriptedSource::new(vec![page(0..2, Some(2)), page(2..4, Some(2))]);

    let result = Paginator::new(2).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(source.calls(), 1);
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.stop, PageStop::ReachedTotal(2));
}

#[tokio::test]
async fn test_zero_total_is_not_a_stop_signal() {
    let source = ScriptedSource::new(vec![page(0..2, Some(0)), page(2..3, Some(0))]);

    let result = Paginator::new(2).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(result.records.len(), 3);
    assert_eq!(result.stop, PageStop::ShortPage);
}

#[tokio::test]
async fn test_page_limit_stops_endless_source() {
    let source = ScriptedSource::new((0..10).map(|i| page(i * 2..i * 2 + 2, None)).collect());

    let result = Paginator::new(2)
        .with_max_pages(4)
        .fetch_all(&source, "/combats", "combats")
        .await;

    assert_eq!(source.calls(), 4);
    assert_eq!(result.records.len(), 8);
    assert_eq!(result.pages, 4);
    assert_eq!(result.stop, PageStop::PageLimit);
}

#[tokio::test]
async fn test_requests_are_sequential_pages_with_fixed_size() {
    let source = ScriptedSource::new(vec![page(0..5, None), page(5..10, None), page(10..12, None)]);

    Paginator::new(5).fetch_all(&source, "/combats", "combats").await;

    assert_eq!(source.requested(), vec![(1, 5), (2, 5), (3, 5)]);
}
