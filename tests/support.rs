#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use sitefeed::{
    config::Config,
    contact::SubmissionLocks,
    db,
    feed::FeedClient,
    kv::{MemoryKv, MockClock},
    sheets::SqliteSheets,
    state::AppState,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use tower::ServiceExt;

/// Router plus handles on its state for assertions.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: MockClock,
}

/// Single-connection in-memory database with the schema applied.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");
    db::create_schema(&pool)
        .await
        .expect("failed to create schema");
    pool
}

pub async fn test_app(feed_url: &str) -> TestApp {
    let pool = test_pool().await;
    let clock = MockClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap());
    let config = Config {
        events_feed_url: feed_url.to_string(),
        ..Config::default()
    };
    let state = AppState {
        sheets: Arc::new(SqliteSheets::new(pool.clone())),
        kv: Arc::new(MemoryKv::new(Arc::new(clock.clone()))),
        contact_locks: Arc::new(SubmissionLocks::default()),
        feed: FeedClient::new().expect("failed to build feed client"),
        config: Arc::new(config),
        pool,
    };
    TestApp {
        router: sitefeed::router(state.clone()),
        state,
        clock,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router call failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
