//! Hosted-checkout webhook integration tests: the signature gate, charge
//! recording, subscription cancellation, and acknowledgment semantics.

mod common;

use common::*;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha512;

use donations_api::api;
use donations_api::db;
use donations_api::donations::{DonationStatus, NewDonation};

fn sign(payload: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

async fn deliver(
    router: &axum::Router,
    payload: &serde_json::Value,
    signature: &str,
) -> (StatusCode, serde_json::Value) {
    let body = payload.to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/paystack")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-paystack-signature", signature)
        .body(Body::from(body))
        .unwrap();
    send(router, request).await
}

async fn deliver_signed(
    router: &axum::Router,
    payload: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let signature = sign(payload.to_string().as_bytes(), PAYSTACK_SECRET);
    deliver(router, payload, &signature).await
}

fn charge_success_event(reference: &str) -> serde_json::Value {
    json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "amount": 5000,
            "currency": "GHS",
            "customer": { "email": "kofi@example.com" },
            "plan": { "plan_code": "PLN_monthly_50" },
            "metadata": {
                "custom_fields": [
                    { "display_name": "Donor Name", "variable_name": "donor_name", "value": "Kofi" },
                    { "display_name": "Donation Type", "variable_name": "donation_type", "value": "recurring" },
                    { "display_name": "Phone Number", "variable_name": "phone", "value": "+233201111111" }
                ]
            }
        }
    })
}

#[tokio::test]
async fn charge_success_inserts_settled_row() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    let (status, body) = deliver_signed(&app, &charge_success_event("PS_1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let row = db::donation_by_reference(&state.pool, "PS_1").await.unwrap().unwrap();
    assert_eq!(row.payment_status, "successful");
    assert_eq!(row.amount, 50.0);
    assert_eq!(row.donor_name, "Kofi");
    assert_eq!(row.donation_type, "recurring");
    assert_eq!(row.phone.as_deref(), Some("+233201111111"));
    assert_eq!(row.subscription_code.as_deref(), Some("PLN_monthly_50"));
}

#[tokio::test]
async fn charge_without_metadata_defaults_donor_fields() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    let event = json!({
        "event": "charge.success",
        "data": { "reference": "PS_2", "amount": 1500 }
    });
    let (status, _) = deliver_signed(&app, &event).await;

    assert_eq!(status, StatusCode::OK);
    let row = db::donation_by_reference(&state.pool, "PS_2").await.unwrap().unwrap();
    assert_eq!(row.donor_name, "Anonymous");
    assert_eq!(row.email, "unknown@email.com");
    assert_eq!(row.donation_type, "one-time");
    assert_eq!(row.amount, 15.0);
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_touching_the_store() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    let payload = charge_success_event("PS_3");
    let forged = sign(payload.to_string().as_bytes(), "some_other_secret");
    let (status, body) = deliver(&app, &payload, &forged).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid signature");
    assert!(db::donation_by_reference(&state.pool, "PS_3").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    let payload = charge_success_event("PS_4");
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/paystack")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(db::donation_by_reference(&state.pool, "PS_4").await.unwrap().is_none());
}

#[tokio::test]
async fn redelivered_charge_keeps_a_single_row() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    let event = charge_success_event("PS_5");
    let (first, _) = deliver_signed(&app, &event).await;
    let (second, _) = deliver_signed(&app, &event).await;

    // Both deliveries are acknowledged; the unique reference keeps one row.
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(db::all_donations(&state.pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_not_renew_cancels_matching_rows() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    db::insert_donation(
        &state.pool,
        &NewDonation {
            donor_name: "Kofi".to_string(),
            email: "kofi@example.com".to_string(),
            phone: None,
            amount: 50.0,
            currency: "GHS".to_string(),
            donation_type: "recurring".to_string(),
            payment_reference: "PS_6".to_string(),
            payment_status: DonationStatus::Successful,
            subscription_code: Some("SUB_42".to_string()),
        },
    )
    .await
    .unwrap();
    let app = api::router(state.clone());

    let event = json!({
        "event": "subscription.not_renew",
        "data": { "subscription_code": "SUB_42", "customer": { "email": "kofi@example.com" } }
    });
    let (status, body) = deliver_signed(&app, &event).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    let row = db::donation_by_reference(&state.pool, "PS_6").await.unwrap().unwrap();
    assert_eq!(row.payment_status, "cancelled");
}

#[tokio::test]
async fn observed_only_events_are_acknowledged_without_writes() {
    let state = test_state(None, Some(paystack_config("http://127.0.0.1:9"))).await;
    let app = api::router(state.clone());

    for event_name in [
        "subscription.create",
        "subscription.disable",
        "invoice.payment_failed",
        "transfer.success",
        "transfer.failed",
        "paymentrequest.pending",
    ] {
        let event = json!({ "event": event_name, "data": { "subscription_code": "SUB_X" } });
        let (status, body) = deliver_signed(&app, &event).await;
        assert_eq!(status, StatusCode::OK, "{event_name} should be acknowledged");
        assert_eq!(body["received"], true);
    }

    assert!(db::all_donations(&state.pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_without_credentials_is_a_config_error() {
    let state = test_state(None, None).await;
    let app = api::router(state);

    let (status, body) = deliver_signed(&app, &charge_success_event("PS_7")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server configuration error");
}
