//! Hubtel client — checkout initiation, transaction status, and callback
//! payload normalization.
//!
//! Callback notifications are loosely typed: field names arrive capitalized
//! (`Data`, `ResponseCode`) or camel-cased depending on the delivery path.
//! [`CallbackData::from_value`] maps both variants onto one struct at the
//! boundary so the handlers never see the inconsistency.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::HubtelConfig;
use crate::errors::Result;

/// Response code for an accepted request / settled payment.
pub const SUCCESS_RESPONSE_CODE: &str = "0000";

/// Transaction status reported for a settled payment.
pub const STATUS_SUCCESS: &str = "Success";
/// Transaction status reported for a failed payment.
pub const STATUS_FAILED: &str = "Failed";

#[derive(Clone)]
pub struct HubtelClient {
    http: Client,
    checkout_base: String,
    status_base: String,
    api_id: String,
    api_key: String,
    merchant_account: String,
}

/// Body for the checkout-initiation call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub total_amount: f64,
    pub description: String,
    pub callback_url: String,
    pub return_url: String,
    pub cancellation_url: String,
    pub merchant_account_number: String,
    pub client_reference: String,
}

/// Raw reply from a gateway call: HTTP status plus the undecoded JSON body.
/// Handlers log the raw body to the audit trail before interpreting it.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub status: u16,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_http_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Decoded checkout-initiation response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub response_code: Option<String>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<InitiateData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateData {
    pub checkout_url: Option<String>,
    pub checkout_id: Option<String>,
    pub checkout_direct_url: Option<String>,
}

impl InitiateResponse {
    /// Decode leniently: a body this struct cannot represent is treated the
    /// same as a response with no success markers.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(SUCCESS_RESPONSE_CODE)
    }
}

/// Decoded transaction-status response. This API answers in PascalCase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
    #[serde(rename = "Data", default)]
    pub data: Option<Vec<TransactionRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "TransactionStatus")]
    pub status: Option<String>,
    #[serde(rename = "TransactionId")]
    pub transaction_id: Option<String>,
    #[serde(rename = "ClientReference")]
    pub client_reference: Option<String>,
    #[serde(rename = "Amount")]
    pub amount: Option<f64>,
}

impl StatusResponse {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(SUCCESS_RESPONSE_CODE)
    }

    pub fn first_transaction(&self) -> Option<&TransactionRecord> {
        self.data.as_deref().and_then(|records| records.first())
    }
}

impl HubtelClient {
    pub fn new(http: Client, config: HubtelConfig) -> Self {
        Self {
            http,
            checkout_base: config.checkout_base,
            status_base: config.status_base,
            api_id: config.api_id,
            api_key: config.api_key,
            merchant_account: config.merchant_account,
        }
    }

    pub fn merchant_account(&self) -> &str {
        &self.merchant_account
    }

    /// Basic credentials, `api_id:api_key` base64-encoded.
    fn basic_auth(&self) -> String {
        format!(
            "Basic {}",
            BASE64.encode(format!("{}:{}", self.api_id, self.api_key))
        )
    }

    /// Ask the aggregator for a hosted checkout page.
    pub async fn initiate(&self, request: &InitiateRequest) -> Result<GatewayReply> {
        let url = format!("{}/items/initiate", self.checkout_base);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: Value = response.json().await?;
        debug!("Initiate reply ({status}): {body}");
        Ok(GatewayReply { status, body })
    }

    /// Transaction status lookup by client reference.
    pub async fn transaction_status(&self, client_reference: &str) -> Result<GatewayReply> {
        let url = format!(
            "{}/v1/merchantaccount/merchants/{}/transactions/status",
            self.status_base, self.merchant_account
        );
        let response = self
            .http
            .get(&url)
            .query(&[("clientReference", client_reference)])
            .header(reqwest::header::AUTHORIZATION, self.basic_auth())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body: Value = response.json().await?;
        debug!("Status reply ({status}): {body}");
        Ok(GatewayReply { status, body })
    }
}

// ─────────────────────────────────────────────────────────
// Callback normalization
// ─────────────────────────────────────────────────────────

/// A callback payload reduced to the fields the handlers act on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackData {
    pub response_code: Option<String>,
    pub client_reference: Option<String>,
    pub status: Option<String>,
    pub sales_invoice_id: Option<String>,
    pub amount: Option<f64>,
}

impl CallbackData {
    /// Normalize a raw callback body, tolerating either field casing.
    pub fn from_value(value: &Value) -> Self {
        let data = field(value, &["Data", "data"]).cloned().unwrap_or(Value::Null);
        CallbackData {
            response_code: string_field(value, &["ResponseCode", "responseCode"]),
            client_reference: string_field(&data, &["ClientReference", "clientReference"]),
            status: string_field(&data, &["Status", "status"]),
            sales_invoice_id: string_field(&data, &["SalesInvoiceId", "salesInvoiceId"]),
            amount: number_field(&data, &["Amount", "amount"]),
        }
    }

    /// A callback only reports a settled payment when both markers agree.
    pub fn is_success(&self) -> bool {
        self.response_code.as_deref() == Some(SUCCESS_RESPONSE_CODE)
            && self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}

fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| value.get(key))
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_field(value: &Value, keys: &[&str]) -> Option<f64> {
    field(value, keys).and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
