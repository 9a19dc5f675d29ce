//! Axum REST API — request handlers for the donation payment flows.
//!
//! Every handler is a stateless request/response cycle; the only shared
//! pieces are the connection pool and the gateway clients in [`ApiState`].
//! Status updates go through the donation's `payment_reference`, so a
//! redelivered callback simply re-applies the same terminal state.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::donations::{
    self, DonationRecord, DonationStatus, EventRecord, LogType, NewDonation, PaymentLogRecord,
};
use crate::email::ReceiptMailer;
use crate::errors::ApiError;
use crate::hubtel::{self, CallbackData, HubtelClient, InitiateRequest, InitiateResponse, StatusResponse};
use crate::paystack::{self, ChargeData, PaystackClient, SubscriptionData, WebhookEnvelope, WebhookEventKind};

pub struct ApiState {
    pub pool: SqlitePool,
    pub config: Config,
    pub hubtel: Option<HubtelClient>,
    pub paystack: Option<PaystackClient>,
    pub mailer: Option<ReceiptMailer>,
}

/// Build the service router with permissive CORS and request tracing, so
/// every endpoint also answers its `OPTIONS` preflight.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/donations/initiate", post(initiate_donation))
        .route("/api/donations/callback", post(payment_callback))
        .route("/api/donations/verify", post(verify_payment))
        .route("/api/donations/metrics", get(donation_metrics))
        .route("/api/webhooks/paystack", post(paystack_webhook))
        .route("/api/subscriptions", post(create_subscription))
        .route("/api/admin/verify-password", post(verify_admin_password))
        .route("/api/admin/donations", get(admin_donations))
        .route("/api/admin/logs/:reference", get(admin_logs))
        .route("/api/events", get(site_events))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

#[derive(Serialize)]
struct DonationsResponse {
    count: usize,
    donations: Vec<DonationRecord>,
}

#[derive(Serialize)]
struct LogsResponse {
    payment_reference: String,
    count: usize,
    logs: Vec<PaymentLogRecord>,
}

#[derive(Serialize)]
struct EventsResponse {
    count: usize,
    events: Vec<EventRecord>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            details: None,
        }),
    )
        .into_response()
}

fn gateway_error_response(message: impl Into<String>, details: Value) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
            details: Some(details),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────

/// `GET /health`
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─────────────────────────────────────────────────────────
// Donation intake
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateDonationRequest {
    total_amount: Option<f64>,
    description: Option<String>,
    client_reference: Option<String>,
    email: Option<String>,
    donor_name: Option<String>,
    phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateDonationResponse {
    checkout_url: Option<String>,
    checkout_id: Option<String>,
    client_reference: String,
}

/// `POST /api/donations/initiate`
///
/// Creates the pending donation row first, then asks the aggregator for a
/// checkout URL. A row therefore exists even when the outbound call fails,
/// and a failed call moves it to `failed` rather than leaving it pending.
async fn initiate_donation(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<InitiateDonationRequest>,
) -> Response {
    let Some(hubtel) = state.hubtel.clone() else {
        error!("Hubtel credentials not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment gateway not configured",
        );
    };

    let amount = match request.total_amount {
        Some(amount) if amount > 0.0 => amount,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "totalAmount must be a positive number",
            )
        }
    };
    let Some(email) = request.email.filter(|e| !e.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "email is required");
    };
    let Some(reference) = request.client_reference.filter(|r| !r.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "clientReference is required");
    };

    info!("Initiating checkout for {reference}: {} {amount}", state.config.currency);

    let donation = NewDonation {
        donor_name: request
            .donor_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Anonymous".to_string()),
        email,
        phone: request.phone.filter(|p| !p.is_empty()),
        amount,
        currency: state.config.currency.clone(),
        donation_type: "one-time".to_string(),
        payment_reference: reference.clone(),
        payment_status: DonationStatus::Pending,
        subscription_code: None,
    };

    if let Err(e) = db::insert_donation(&state.pool, &donation).await {
        error!("Failed to create pending donation {reference}: {e}");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to initialize donation",
        );
    }

    let initiate = InitiateRequest {
        total_amount: amount,
        description: request
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| state.config.donation_description.clone()),
        callback_url: format!("{}/api/donations/callback", state.config.public_base_url),
        return_url: state.config.return_url.clone(),
        cancellation_url: state.config.cancel_url.clone(),
        merchant_account_number: hubtel.merchant_account().to_string(),
        client_reference: reference.clone(),
    };

    let request_json = serde_json::to_value(&initiate).unwrap_or(Value::Null);
    log_or_warn(
        &state.pool,
        &reference,
        LogType::InitiateRequest,
        Some(&request_json),
        None,
        None,
        None,
    )
    .await;

    let reply = match hubtel.initiate(&initiate).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Checkout initiation failed for {reference}: {e}");
            log_or_warn(
                &state.pool,
                &reference,
                LogType::InitiateResponse,
                None,
                None,
                None,
                Some(&e.to_string()),
            )
            .await;
            mark_failed(&state.pool, &reference).await;
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize payment",
            );
        }
    };

    let parsed = InitiateResponse::from_value(&reply.body);
    let log_error = if reply.is_http_ok() && parsed.is_success() {
        None
    } else {
        parsed.message.clone()
    };
    log_or_warn(
        &state.pool,
        &reference,
        LogType::InitiateResponse,
        None,
        Some(&reply.body),
        Some(reply.status as i64),
        log_error.as_deref(),
    )
    .await;

    if !reply.is_http_ok() || !parsed.is_success() {
        error!("Checkout initiation rejected for {reference}: {}", reply.body);
        mark_failed(&state.pool, &reference).await;
        return gateway_error_response(
            "Failed to initialize payment",
            parsed.message.map(Value::String).unwrap_or(Value::Null),
        );
    }

    let data = parsed.data.unwrap_or_default();
    (
        StatusCode::OK,
        Json(InitiateDonationResponse {
            checkout_url: data.checkout_url,
            checkout_id: data.checkout_id,
            client_reference: reference,
        }),
    )
        .into_response()
}

async fn mark_failed(pool: &SqlitePool, reference: &str) {
    if let Err(e) = db::update_status(pool, reference, DonationStatus::Failed).await {
        error!("Failed to mark donation {reference} as failed: {e}");
    }
}

async fn log_or_warn(
    pool: &SqlitePool,
    reference: &str,
    log_type: LogType,
    request_data: Option<&Value>,
    response_data: Option<&Value>,
    status_code: Option<i64>,
    error_message: Option<&str>,
) {
    if let Err(e) = db::insert_payment_log(
        pool,
        reference,
        log_type,
        request_data,
        response_data,
        status_code,
        error_message,
    )
    .await
    {
        warn!("Failed to write {} log for {reference}: {e}", log_type.as_str());
    }
}

// ─────────────────────────────────────────────────────────
// Payment callback
// ─────────────────────────────────────────────────────────

/// `POST /api/donations/callback`
///
/// Server-to-server notification from the aggregator. Responds 200 to every
/// interpreted payload, including failed payments (a terminal outcome, not a
/// delivery failure). Only a failed local update on the success path answers
/// 500, which the gateway treats as retry-eligible.
async fn payment_callback(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<Value>,
) -> Response {
    let callback = CallbackData::from_value(&payload);

    let Some(reference) = callback.client_reference.clone() else {
        error!("Callback without a client reference: {payload}");
        return error_response(StatusCode::BAD_REQUEST, "ClientReference missing");
    };

    info!(
        "Processing callback for {reference}: code={:?} status={:?} amount={:?}",
        callback.response_code, callback.status, callback.amount
    );

    if callback.is_success() {
        if let Err(e) = db::update_status(&state.pool, &reference, DonationStatus::Paid).await {
            error!("Failed to mark donation {reference} as paid: {e}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update donation",
            );
        }
        info!("Donation {reference} marked as paid");
        send_receipt_async(&state, &reference).await;
    } else {
        info!("Payment failed for {reference}: {:?}", callback.status);
        if let Err(e) = db::update_status(&state.pool, &reference, DonationStatus::Failed).await {
            error!("Failed to mark donation {reference} as failed: {e}");
        }
    }

    (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
}

/// Fire the receipt email without blocking or failing the callback.
async fn send_receipt_async(state: &Arc<ApiState>, reference: &str) {
    let Some(mailer) = state.mailer.clone() else {
        return;
    };

    let donation = match db::donation_by_reference(&state.pool, reference).await {
        Ok(Some(donation)) => donation,
        Ok(None) => return,
        Err(e) => {
            warn!("Skipping receipt for {reference}: {e}");
            return;
        }
    };

    tokio::task::spawn_blocking(move || {
        if let Err(e) = mailer.send_receipt(
            &donation.email,
            &donation.donor_name,
            donation.amount,
            &donation.currency,
            &donation.payment_reference,
        ) {
            warn!("Receipt email for {} failed: {e:#}", donation.payment_reference);
        }
    });
}

// ─────────────────────────────────────────────────────────
// Payment verify
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    client_reference: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
}

/// `POST /api/donations/verify`
///
/// Pull-based reconciliation: asks the aggregator for the transaction status
/// and syncs the local row. "Unknown to the gateway" is reported as pending,
/// not as an error — the callback may simply not have fired yet.
async fn verify_payment(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let Some(hubtel) = state.hubtel.clone() else {
        error!("Hubtel credentials not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Payment gateway not configured",
        );
    };
    let Some(reference) = request.client_reference.filter(|r| !r.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "clientReference is required");
    };

    info!("Verifying payment for {reference}");

    let reply = match hubtel.transaction_status(&reference).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Status lookup failed for {reference}: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify payment");
        }
    };

    log_or_warn(
        &state.pool,
        &reference,
        LogType::Verification,
        None,
        Some(&reply.body),
        Some(reply.status as i64),
        None,
    )
    .await;

    let status_reply = StatusResponse::from_value(&reply.body);
    let transaction = match status_reply.first_transaction() {
        Some(transaction) if status_reply.is_success() => transaction,
        _ => {
            return (
                StatusCode::OK,
                Json(VerifyResponse {
                    status: "pending",
                    message: "Transaction not found or still pending on the gateway".to_string(),
                    transaction_id: None,
                }),
            )
                .into_response();
        }
    };

    match db::donation_by_reference(&state.pool, &reference).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            error!("Payment record {reference} not found locally");
            return error_response(StatusCode::NOT_FOUND, "Payment record not found");
        }
        Err(e) => {
            error!("Failed to load donation {reference}: {e}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify payment");
        }
    }

    let invoice_id = transaction.transaction_id.clone().unwrap_or_default();
    match transaction.status.as_deref() {
        Some(s) if s == hubtel::STATUS_SUCCESS => {
            if let Err(e) = db::update_status_with_invoice(
                &state.pool,
                &reference,
                DonationStatus::Paid,
                &invoice_id,
            )
            .await
            {
                error!("Failed to mark donation {reference} as paid: {e}");
            }
            (
                StatusCode::OK,
                Json(VerifyResponse {
                    status: "success",
                    message: "Payment verified and updated successfully".to_string(),
                    transaction_id: transaction.transaction_id.clone(),
                }),
            )
                .into_response()
        }
        Some(s) if s == hubtel::STATUS_FAILED => {
            if let Err(e) = db::update_status_with_invoice(
                &state.pool,
                &reference,
                DonationStatus::Failed,
                &invoice_id,
            )
            .await
            {
                error!("Failed to mark donation {reference} as failed: {e}");
            }
            (
                StatusCode::OK,
                Json(VerifyResponse {
                    status: "failed",
                    message: "Payment failed. Status updated.".to_string(),
                    transaction_id: None,
                }),
            )
                .into_response()
        }
        other => (
            StatusCode::OK,
            Json(VerifyResponse {
                status: "pending",
                message: format!("Payment status is '{}'", other.unwrap_or("Unknown")),
                transaction_id: None,
            }),
        )
            .into_response(),
    }
}

// ─────────────────────────────────────────────────────────
// Hosted-checkout webhook
// ─────────────────────────────────────────────────────────

/// `POST /api/webhooks/paystack`
///
/// The signature covers the raw body, so the handler takes `Bytes` and only
/// parses after the HMAC check passes. Every interpreted event is answered
/// 200 — the provider retries anything else, and an unrecognized event is a
/// valid delivery, not a failure.
async fn paystack_webhook(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(paystack) = state.paystack.clone() else {
        error!("Paystack secret not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        );
    };

    let signature = headers
        .get("x-paystack-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !paystack::verify_signature(paystack.secret_key(), &body, signature) {
        warn!("Webhook rejected: invalid signature");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!("Webhook body is not a valid event envelope: {e}");
            return error_response(StatusCode::BAD_REQUEST, "Malformed event");
        }
    };

    info!("Received webhook event: {}", envelope.event);

    match envelope.kind() {
        WebhookEventKind::ChargeSuccess => handle_charge_success(&state, envelope.data).await,
        WebhookEventKind::SubscriptionNotRenew => {
            handle_subscription_cancelled(&state, envelope.data).await
        }
        WebhookEventKind::SubscriptionCreate => {
            info!("New subscription created: {}", envelope.data);
        }
        WebhookEventKind::SubscriptionDisable => {
            info!("Subscription disabled: {}", envelope.data);
        }
        WebhookEventKind::InvoicePaymentFailed => {
            info!("Invoice payment failed: {}", envelope.data);
        }
        WebhookEventKind::TransferSuccess | WebhookEventKind::TransferFailed => {
            info!("Transfer event {}: {}", envelope.event, envelope.data);
        }
        WebhookEventKind::Unknown => {
            info!("Unhandled event type: {}", envelope.event);
        }
    }

    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

/// `charge.success` inserts a finished row: this provider's flow has no
/// pending row to update, the charge is the first the service hears of it.
async fn handle_charge_success(state: &Arc<ApiState>, data: Value) {
    let charge: ChargeData = match serde_json::from_value(data) {
        Ok(charge) => charge,
        Err(e) => {
            error!("charge.success payload did not parse: {e}");
            return;
        }
    };

    let donation = NewDonation {
        donor_name: charge
            .custom_field("donor_name")
            .unwrap_or_else(|| "Anonymous".to_string()),
        email: charge
            .customer
            .as_ref()
            .and_then(|c| c.email.clone())
            .unwrap_or_else(|| "unknown@email.com".to_string()),
        phone: charge.custom_field("phone"),
        amount: charge.major_amount(),
        currency: charge
            .currency
            .clone()
            .unwrap_or_else(|| state.config.currency.clone()),
        donation_type: charge
            .custom_field("donation_type")
            .unwrap_or_else(|| "one-time".to_string()),
        payment_reference: charge.reference.clone(),
        payment_status: DonationStatus::Successful,
        subscription_code: charge.plan.as_ref().and_then(|p| p.plan_code.clone()),
    };

    match db::insert_donation(&state.pool, &donation).await {
        Ok(()) => info!("Recorded settled charge {}", charge.reference),
        // A redelivered webhook hits the unique reference constraint; the
        // row from the first delivery already holds the same truth.
        Err(e) => warn!("Could not record charge {}: {e}", charge.reference),
    }
}

async fn handle_subscription_cancelled(state: &Arc<ApiState>, data: Value) {
    let subscription: SubscriptionData = match serde_json::from_value(data) {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("subscription.not_renew payload did not parse: {e}");
            return;
        }
    };

    let Some(code) = subscription.subscription_code else {
        warn!("subscription.not_renew without a subscription code");
        return;
    };

    match db::cancel_subscription_donations(&state.pool, &code).await {
        Ok(count) => info!("Cancelled {count} donation(s) for subscription {code}"),
        Err(e) => error!("Failed to cancel donations for subscription {code}: {e}"),
    }
}

// ─────────────────────────────────────────────────────────
// Subscription creation
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CreateSubscriptionRequest {
    email: Option<String>,
    amount: Option<f64>,
    name: Option<String>,
    phone: Option<String>,
    #[serde(default = "default_interval")]
    interval: String,
}

fn default_interval() -> String {
    "monthly".to_string()
}

#[derive(Serialize)]
struct CreateSubscriptionResponse {
    authorization_url: String,
    access_code: String,
    reference: String,
    plan_code: String,
}

/// `POST /api/subscriptions`
///
/// Resolves the recurring-billing plan for the amount (get-or-create, with
/// one retry on a creation race), then initializes a transaction bound to
/// it and hands back the hosted authorization URL.
async fn create_subscription(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Response {
    let Some(paystack) = state.paystack.clone() else {
        error!("Paystack secret not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        );
    };

    let Some(email) = request.email.filter(|e| !e.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "email is required");
    };
    let amount = match request.amount {
        Some(amount) if amount > 0.0 => amount,
        _ => {
            return error_response(StatusCode::BAD_REQUEST, "amount must be a positive number")
        }
    };

    let plan = match paystack.ensure_plan(amount, &request.interval).await {
        Ok(plan) => plan,
        Err(ApiError::Gateway(details)) => {
            error!("Plan resolution failed: {details}");
            return gateway_error_response("Failed to create subscription plan", details);
        }
        Err(e) => {
            error!("Plan resolution failed: {e}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create subscription plan",
            );
        }
    };

    let donor_name = request
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or("Anonymous");
    let phone = request.phone.as_deref().unwrap_or("");

    let authorization = match paystack
        .initialize_subscription(&email, amount, &plan.plan_code, donor_name, phone)
        .await
    {
        Ok(authorization) => authorization,
        Err(ApiError::Gateway(details)) => {
            error!("Subscription initialization failed: {details}");
            return gateway_error_response("Failed to initialize subscription", details);
        }
        Err(e) => {
            error!("Subscription initialization failed: {e}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to initialize subscription",
            );
        }
    };

    (
        StatusCode::OK,
        Json(CreateSubscriptionResponse {
            authorization_url: authorization.authorization_url,
            access_code: authorization.access_code,
            reference: authorization.reference,
            plan_code: plan.plan_code,
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────

/// `GET /api/donations/metrics`
async fn donation_metrics(State(state): State<Arc<ApiState>>) -> Response {
    match db::donation_stat_rows(&state.pool).await {
        Ok(rows) => (StatusCode::OK, Json(donations::aggregate_metrics(&rows))).into_response(),
        Err(e) => {
            error!("Failed to load donation metrics: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load donation metrics",
            )
        }
    }
}

// ─────────────────────────────────────────────────────────
// Admin
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AdminPasswordRequest {
    password: Option<String>,
}

/// `POST /api/admin/verify-password`
///
/// Plain equality against the configured secret. The admin view holds the
/// result client-side; no session or token is issued.
async fn verify_admin_password(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AdminPasswordRequest>,
) -> Response {
    let Some(expected) = state.config.admin_password.clone() else {
        error!("Admin password not configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Admin password not configured",
        );
    };

    if request.password.as_deref() == Some(expected.as_str()) {
        (StatusCode::OK, Json(json!({ "success": true }))).into_response()
    } else {
        info!("Invalid admin password attempt");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "error": "Invalid password" })),
        )
            .into_response()
    }
}

/// `GET /api/admin/donations`
///
/// Donation rows for the reconciliation view, newest first.
async fn admin_donations(State(state): State<Arc<ApiState>>) -> Response {
    match db::all_donations(&state.pool).await {
        Ok(donations) => {
            let count = donations.len();
            (StatusCode::OK, Json(DonationsResponse { count, donations })).into_response()
        }
        Err(e) => {
            error!("Failed to list donations: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list donations")
        }
    }
}

/// `GET /api/admin/logs/:reference`
///
/// The audit trail for one payment reference, oldest first.
async fn admin_logs(
    State(state): State<Arc<ApiState>>,
    Path(reference): Path<String>,
) -> Response {
    match db::logs_for_reference(&state.pool, &reference).await {
        Ok(logs) => {
            let count = logs.len();
            (
                StatusCode::OK,
                Json(LogsResponse {
                    payment_reference: reference,
                    count,
                    logs,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to list payment logs for {reference}: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list payment logs",
            )
        }
    }
}

// ─────────────────────────────────────────────────────────
// Site events
// ─────────────────────────────────────────────────────────

/// `GET /api/events`
async fn site_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(EventsResponse { count, events })).into_response()
        }
        Err(e) => {
            error!("Failed to list events: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to list events")
        }
    }
}
