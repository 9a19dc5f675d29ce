//! Application configuration loaded from environment variables.
//!
//! Gateway credential groups are optional: the service boots without them,
//! and the handlers that need an absent group answer 500 per request. That
//! keeps credential-free deployments (metrics, events, admin listing)
//! functional.

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Public base URL of this service; the gateway posts callbacks to it
    pub public_base_url: String,
    /// Where the donor lands after completing checkout
    pub return_url: String,
    /// Where the donor lands after abandoning checkout
    pub cancel_url: String,
    /// The single ISO currency code every donation uses
    pub currency: String,
    /// Default description shown on the hosted checkout page
    pub donation_description: String,
    /// Card / mobile-money aggregator credentials
    pub hubtel: Option<HubtelConfig>,
    /// Hosted-checkout provider credentials
    pub paystack: Option<PaystackConfig>,
    /// Secret gating the admin reconciliation view
    pub admin_password: Option<String>,
    /// SMTP credentials for donation receipts
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct HubtelConfig {
    pub api_id: String,
    pub api_key: String,
    pub merchant_account: String,
    /// Base URL of the checkout-initiation API
    pub checkout_base: String,
    /// Base URL of the transaction-status API
    pub status_base: String,
}

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let hubtel = match (
            env_var("HUBTEL_API_ID"),
            env_var("HUBTEL_API_KEY"),
            env_var("HUBTEL_MERCHANT_ACCOUNT"),
        ) {
            (Ok(api_id), Ok(api_key), Ok(merchant_account)) => Some(HubtelConfig {
                api_id,
                api_key,
                merchant_account,
                checkout_base: env_var("HUBTEL_CHECKOUT_URL")
                    .unwrap_or_else(|_| "https://payproxyapi.hubtel.com".to_string()),
                status_base: env_var("HUBTEL_STATUS_URL")
                    .unwrap_or_else(|_| "https://rmsc.hubtel.com".to_string()),
            }),
            _ => None,
        };

        let paystack = env_var("PAYSTACK_SECRET_KEY").ok().map(|secret_key| PaystackConfig {
            secret_key,
            api_base: env_var("PAYSTACK_API_URL")
                .unwrap_or_else(|_| "https://api.paystack.co".to_string()),
        });

        let smtp = match (
            env_var("SMTP_HOST"),
            env_var("SMTP_USERNAME"),
            env_var("SMTP_PASSWORD"),
            env_var("RECEIPT_FROM"),
        ) {
            (Ok(host), Ok(username), Ok(password), Ok(from_address)) => Some(SmtpConfig {
                host,
                port: env_var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| ApiError::Config("Invalid SMTP_PORT".to_string()))?,
                username,
                password,
                from_address,
            }),
            _ => None,
        };

        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./donations.db".to_string()),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| ApiError::Config("Invalid API_PORT".to_string()))?,
            public_base_url: env_var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            return_url: env_var("RETURN_URL")
                .unwrap_or_else(|_| "http://localhost:3000/donate?payment=success".to_string()),
            cancel_url: env_var("CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/donate?payment=cancelled".to_string()),
            currency: env_var("DONATION_CURRENCY").unwrap_or_else(|_| "GHS".to_string()),
            donation_description: env_var("DONATION_DESCRIPTION")
                .unwrap_or_else(|_| "Charitable donation".to_string()),
            hubtel,
            paystack,
            admin_password: env_var("ADMIN_PASSWORD").ok(),
            smtp,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ApiError::Config(format!("Missing env var: {key}")))
}
