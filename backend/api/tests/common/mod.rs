//! Shared helpers for the integration suites: in-memory application state,
//! router requests, and stub gateway servers on ephemeral ports.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower::ServiceExt;

use donations_api::api::ApiState;
use donations_api::config::{Config, HubtelConfig, PaystackConfig};
use donations_api::db;
use donations_api::hubtel::HubtelClient;
use donations_api::paystack::PaystackClient;

pub const ADMIN_PASSWORD: &str = "reconcile-me";
pub const PAYSTACK_SECRET: &str = "sk_test_webhook_secret";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        api_port: 0,
        public_base_url: "http://localhost:3001".to_string(),
        return_url: "http://localhost:3000/donate?payment=success".to_string(),
        cancel_url: "http://localhost:3000/donate?payment=cancelled".to_string(),
        currency: "GHS".to_string(),
        donation_description: "Charitable donation".to_string(),
        hubtel: None,
        paystack: None,
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        smtp: None,
    }
}

/// Application state over a fresh in-memory database.
pub async fn test_state(
    hubtel: Option<HubtelConfig>,
    paystack: Option<PaystackConfig>,
) -> Arc<ApiState> {
    let pool = db::init_pool("sqlite::memory:").await.expect("in-memory pool");
    let config = test_config();
    let client = reqwest::Client::new();

    Arc::new(ApiState {
        pool,
        hubtel: hubtel.map(|c| HubtelClient::new(client.clone(), c)),
        paystack: paystack.map(|c| PaystackClient::new(client.clone(), c, config.currency.clone())),
        mailer: None,
        config,
    })
}

pub fn hubtel_config(base_url: &str) -> HubtelConfig {
    HubtelConfig {
        api_id: "test-api-id".to_string(),
        api_key: "test-api-key".to_string(),
        merchant_account: "11684".to_string(),
        checkout_base: base_url.to_string(),
        status_base: base_url.to_string(),
    }
}

pub fn paystack_config(base_url: &str) -> PaystackConfig {
    PaystackConfig {
        secret_key: PAYSTACK_SECRET.to_string(),
        api_base: base_url.to_string(),
    }
}

// ─────────────────────────────────────────────────────────
// Router requests
// ─────────────────────────────────────────────────────────

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ─────────────────────────────────────────────────────────
// Stub aggregator
// ─────────────────────────────────────────────────────────

/// Serve a canned aggregator on an ephemeral port: every initiate call gets
/// `initiate`, every status lookup gets `status`. Returns the base URL.
pub async fn spawn_stub_aggregator(
    initiate: (u16, Value),
    status: (u16, Value),
) -> String {
    let app = Router::new()
        .route(
            "/items/initiate",
            post(move || {
                let (code, body) = initiate.clone();
                async move { (StatusCode::from_u16(code).unwrap(), Json(body)) }
            }),
        )
        .route(
            "/v1/merchantaccount/merchants/:merchant/transactions/status",
            get(move || {
                let (code, body) = status.clone();
                async move { (StatusCode::from_u16(code).unwrap(), Json(body)) }
            }),
        );

    serve_on_ephemeral_port(app).await
}

pub async fn serve_on_ephemeral_port(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
