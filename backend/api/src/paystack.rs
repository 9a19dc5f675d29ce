//! Paystack client — webhook signature verification, event envelopes,
//! recurring-billing plans, and transaction initialization.

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha512;
use tracing::debug;
use uuid::Uuid;

use crate::config::PaystackConfig;
use crate::errors::{ApiError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Verify a webhook body against its `x-paystack-signature` header.
///
/// The signature is the hex-encoded HMAC-SHA512 of the raw body under the
/// account secret. The comparison happens inside `verify_slice`, which is
/// constant-time.
pub fn verify_signature(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

// ─────────────────────────────────────────────────────────
// Webhook events
// ─────────────────────────────────────────────────────────

/// Webhook event kinds this service reacts to or acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventKind {
    /// A one-time payment or a subscription charge settled.
    ChargeSuccess,
    /// A new subscription was created (observed only).
    SubscriptionCreate,
    /// The subscriber opted out of renewal.
    SubscriptionNotRenew,
    /// The subscription was disabled by the provider (observed only).
    SubscriptionDisable,
    /// A subscription charge attempt failed (observed only).
    InvoicePaymentFailed,
    TransferSuccess,
    TransferFailed,
    /// Anything else; acknowledged so the provider does not retry.
    Unknown,
}

impl WebhookEventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "charge.success" => Self::ChargeSuccess,
            "subscription.create" => Self::SubscriptionCreate,
            "subscription.not_renew" => Self::SubscriptionNotRenew,
            "subscription.disable" => Self::SubscriptionDisable,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "transfer.success" => Self::TransferSuccess,
            "transfer.failed" => Self::TransferFailed,
            _ => Self::Unknown,
        }
    }
}

/// The outer webhook envelope: an event name plus an event-shaped payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookEnvelope {
    pub fn kind(&self) -> WebhookEventKind {
        WebhookEventKind::from_name(&self.event)
    }
}

/// `charge.success` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChargeData {
    pub reference: String,
    /// Amount in minor units (pesewas).
    pub amount: i64,
    pub currency: Option<String>,
    pub customer: Option<Customer>,
    pub plan: Option<PlanRef>,
    pub metadata: Option<Metadata>,
}

impl ChargeData {
    /// Amount in major currency units.
    pub fn major_amount(&self) -> f64 {
        self.amount as f64 / 100.0
    }

    /// Look up a custom metadata field by `variable_name`.
    pub fn custom_field(&self, name: &str) -> Option<String> {
        self.metadata
            .as_ref()?
            .custom_fields
            .iter()
            .find(|field| field.variable_name == name)
            .and_then(|field| match &field.value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanRef {
    pub plan_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub variable_name: String,
    #[serde(default)]
    pub value: Value,
}

/// `subscription.*` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionData {
    pub subscription_code: Option<String>,
    pub customer: Option<Customer>,
}

// ─────────────────────────────────────────────────────────
// Plans
// ─────────────────────────────────────────────────────────

/// A recurring-billing plan as returned by the plan APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub plan_code: String,
    /// Plan amount in minor units.
    pub amount: i64,
    pub interval: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PlanEnvelope {
    #[serde(default)]
    status: bool,
    data: Option<Plan>,
}

/// Deterministic plan code for an amount + interval pair. Requests that race
/// to create the same plan derive the same code, which is what makes
/// [`PaystackClient::ensure_plan`] idempotent.
pub fn plan_code(amount: f64, interval: &str) -> String {
    format!("donation_{}_{}", interval, format_amount(amount))
}

/// Format an amount without a trailing `.0` for whole values.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}

/// Minor-unit conversion (e.g. cedis to pesewas).
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

enum PlanCreate {
    Created(Plan),
    /// Another request won the creation race.
    Conflict,
    Rejected(Value),
}

/// Result of a successful transaction initialization.
#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Clone)]
pub struct PaystackClient {
    http: Client,
    api_base: String,
    secret_key: String,
    currency: String,
}

impl PaystackClient {
    pub fn new(http: Client, config: PaystackConfig, currency: String) -> Self {
        Self {
            http,
            api_base: config.api_base,
            secret_key: config.secret_key,
            currency,
        }
    }

    /// The webhook handler verifies signatures under this secret.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Resolve the plan for an amount + interval, creating it when absent.
    ///
    /// Two requests can race on the first use of a new amount: both miss the
    /// fetch and both try to create. The provider rejects the loser with an
    /// "already exists" message, and one re-fetch of the same deterministic
    /// code then resolves the winner's plan.
    pub async fn ensure_plan(&self, amount: f64, interval: &str) -> Result<Plan> {
        let code = plan_code(amount, interval);

        if let Some(plan) = self.fetch_plan(&code).await? {
            debug!("Found existing plan {}", plan.plan_code);
            return Ok(plan);
        }

        match self.create_plan(&code, amount, interval).await? {
            PlanCreate::Created(plan) => Ok(plan),
            PlanCreate::Conflict => self.fetch_plan(&code).await?.ok_or_else(|| {
                ApiError::Gateway(json!({
                    "message": format!("Plan {code} reported as existing but not retrievable")
                }))
            }),
            PlanCreate::Rejected(reply) => Err(ApiError::Gateway(reply)),
        }
    }

    async fn fetch_plan(&self, code: &str) -> Result<Option<Plan>> {
        let url = format!("{}/plan/{}", self.api_base, code);
        let response = self.http.get(&url).bearer_auth(&self.secret_key).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let envelope: PlanEnvelope = response.json().await.unwrap_or_default();
        Ok(envelope.data.filter(|_| envelope.status))
    }

    async fn create_plan(&self, code: &str, amount: f64, interval: &str) -> Result<PlanCreate> {
        let body = json!({
            "name": format!("{} donation - {} {}", interval, self.currency, format_amount(amount)),
            "plan_code": code,
            "interval": interval,
            "amount": to_minor_units(amount),
            "currency": self.currency,
        });

        let response = self
            .http
            .post(format!("{}/plan", self.api_base))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;
        let reply: Value = response.json().await?;

        let accepted = reply.get("status").and_then(Value::as_bool).unwrap_or(false);
        if accepted {
            if let Some(data) = reply.get("data") {
                if let Ok(plan) = serde_json::from_value::<Plan>(data.clone()) {
                    return Ok(PlanCreate::Created(plan));
                }
            }
            return Ok(PlanCreate::Rejected(reply));
        }

        let message = reply.get("message").and_then(Value::as_str).unwrap_or_default();
        if message.contains("already exist") {
            Ok(PlanCreate::Conflict)
        } else {
            Ok(PlanCreate::Rejected(reply))
        }
    }

    /// Initialize a hosted-checkout transaction bound to a plan, carrying
    /// donor details as custom metadata fields.
    pub async fn initialize_subscription(
        &self,
        email: &str,
        amount: f64,
        plan_code: &str,
        donor_name: &str,
        phone: &str,
    ) -> Result<Authorization> {
        let reference = format!("donation_sub_{}", Uuid::new_v4().simple());
        let body = json!({
            "email": email,
            "amount": to_minor_units(amount),
            "currency": self.currency,
            "reference": reference,
            "plan": plan_code,
            "metadata": {
                "custom_fields": [
                    {
                        "display_name": "Donor Name",
                        "variable_name": "donor_name",
                        "value": donor_name,
                    },
                    {
                        "display_name": "Donation Type",
                        "variable_name": "donation_type",
                        "value": "recurring",
                    },
                    {
                        "display_name": "Phone Number",
                        "variable_name": "phone",
                        "value": phone,
                    },
                ],
            },
        });

        let response = self
            .http
            .post(format!("{}/transaction/initialize", self.api_base))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;
        let reply: Value = response.json().await?;

        let accepted = reply.get("status").and_then(Value::as_bool).unwrap_or(false);
        if !accepted {
            return Err(ApiError::Gateway(reply));
        }

        let data = reply.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|_| ApiError::Gateway(reply))
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk_test_secret";

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn signature_accepts_valid() {
        let payload = br#"{"event":"charge.success"}"#;
        let signature = sign(payload, SECRET);
        assert!(verify_signature(SECRET, payload, &signature));
    }

    #[test]
    fn signature_rejects_wrong_secret() {
        let payload = br#"{"event":"charge.success"}"#;
        let signature = sign(payload, "some_other_secret");
        assert!(!verify_signature(SECRET, payload, &signature));
    }

    #[test]
    fn signature_rejects_tampered_payload() {
        let signature = sign(br#"{"event":"charge.success"}"#, SECRET);
        assert!(!verify_signature(
            SECRET,
            br#"{"event":"charge.success","amount":1}"#,
            &signature
        ));
    }

    #[test]
    fn signature_rejects_non_hex_header() {
        assert!(!verify_signature(SECRET, b"{}", "not hex at all"));
        assert!(!verify_signature(SECRET, b"{}", ""));
    }

    #[test]
    fn event_kinds_from_names() {
        assert_eq!(WebhookEventKind::from_name("charge.success"), WebhookEventKind::ChargeSuccess);
        assert_eq!(
            WebhookEventKind::from_name("subscription.not_renew"),
            WebhookEventKind::SubscriptionNotRenew
        );
        assert_eq!(
            WebhookEventKind::from_name("transfer.failed"),
            WebhookEventKind::TransferFailed
        );
        assert_eq!(
            WebhookEventKind::from_name("paymentrequest.pending"),
            WebhookEventKind::Unknown
        );
    }

    #[test]
    fn charge_data_reads_custom_fields() {
        let charge: ChargeData = serde_json::from_value(json!({
            "reference": "ref-1",
            "amount": 5000,
            "currency": "GHS",
            "customer": { "email": "ama@example.com" },
            "plan": { "plan_code": "PLN_1" },
            "metadata": {
                "custom_fields": [
                    { "display_name": "Donor Name", "variable_name": "donor_name", "value": "Ama" },
                    { "display_name": "Phone Number", "variable_name": "phone", "value": "" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(charge.major_amount(), 50.0);
        assert_eq!(charge.custom_field("donor_name").as_deref(), Some("Ama"));
        // Empty metadata values are treated as absent.
        assert!(charge.custom_field("phone").is_none());
        assert!(charge.custom_field("donation_type").is_none());
    }

    #[test]
    fn envelope_parses_without_data() {
        let envelope: WebhookEnvelope =
            serde_json::from_str(r#"{"event":"transfer.success"}"#).unwrap();
        assert_eq!(envelope.kind(), WebhookEventKind::TransferSuccess);
        assert!(envelope.data.is_null());
    }

    #[test]
    fn plan_codes_are_deterministic() {
        assert_eq!(plan_code(50.0, "monthly"), "donation_monthly_50");
        assert_eq!(plan_code(12.5, "weekly"), "donation_weekly_12.5");
        assert_eq!(plan_code(50.0, "monthly"), plan_code(50.0, "monthly"));
    }

    #[test]
    fn minor_unit_conversion_rounds() {
        assert_eq!(to_minor_units(50.0), 5000);
        assert_eq!(to_minor_units(12.345), 1235);
        assert_eq!(to_minor_units(0.1), 10);
    }
}
