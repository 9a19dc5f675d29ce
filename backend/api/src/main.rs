//! Donation payment service — entry point.
//!
//! Serves the donation intake, gateway callback/webhook, reconciliation,
//! metrics, and admin endpoints on a single Axum router backed by SQLite.

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use donations_api::api::{self, ApiState};
use donations_api::config::Config;
use donations_api::db;
use donations_api::email::ReceiptMailer;
use donations_api::hubtel::HubtelClient;
use donations_api::paystack::PaystackClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // HTTP client shared by both gateway clients.
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let hubtel = config
        .hubtel
        .clone()
        .map(|c| HubtelClient::new(client.clone(), c));
    if hubtel.is_none() {
        warn!("Hubtel credentials not set; checkout endpoints will answer 500");
    }

    let paystack = config
        .paystack
        .clone()
        .map(|c| PaystackClient::new(client.clone(), c, config.currency.clone()));
    if paystack.is_none() {
        warn!("Paystack secret not set; subscription and webhook endpoints will answer 500");
    }

    let mailer = match &config.smtp {
        Some(smtp) => Some(ReceiptMailer::new(smtp)?),
        None => {
            info!("SMTP not configured; donation receipts disabled");
            None
        }
    };

    let state = Arc::new(ApiState {
        pool,
        config: config.clone(),
        hubtel,
        paystack,
        mailer,
    });

    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
