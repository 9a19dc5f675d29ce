//! Database layer — migrations and row queries for donations, audit logs,
//! and site events.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::donations::{
    DonationRecord, DonationStatus, EventRecord, LogType, NewDonation, PaymentLogRecord, StatRow,
};
use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // An in-memory SQLite database exists per connection; a pool of one keeps
    // the migrations and every query on the same database. Tests rely on it.
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Donation writes
// ─────────────────────────────────────────────────────────

/// Insert a donation row. The unique `payment_reference` constraint rejects
/// duplicates; callers that need redelivery tolerance handle the error.
pub async fn insert_donation(pool: &SqlitePool, donation: &NewDonation) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO donations
            (donor_name, email, phone, amount, currency, donation_type,
             payment_reference, payment_status, subscription_code)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&donation.donor_name)
    .bind(&donation.email)
    .bind(&donation.phone)
    .bind(donation.amount)
    .bind(&donation.currency)
    .bind(&donation.donation_type)
    .bind(&donation.payment_reference)
    .bind(donation.payment_status.as_str())
    .bind(&donation.subscription_code)
    .execute(pool)
    .await?;
    Ok(())
}

/// Move the donation with this reference to a new status.
/// Returns the number of rows touched (0 when the reference is unknown).
pub async fn update_status(
    pool: &SqlitePool,
    reference: &str,
    status: DonationStatus,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE donations SET payment_status = ?1, updated_at = ?2 WHERE payment_reference = ?3",
    )
    .bind(status.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(reference)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Same as [`update_status`], also recording the gateway's transaction id.
pub async fn update_status_with_invoice(
    pool: &SqlitePool,
    reference: &str,
    status: DonationStatus,
    invoice_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE donations
        SET    payment_status = ?1, gateway_invoice_id = ?2, updated_at = ?3
        WHERE  payment_reference = ?4
        "#,
    )
    .bind(status.as_str())
    .bind(invoice_id)
    .bind(Utc::now().to_rfc3339())
    .bind(reference)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Cancel every donation row bound to a recurring-billing subscription.
pub async fn cancel_subscription_donations(
    pool: &SqlitePool,
    subscription_code: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE donations SET payment_status = ?1, updated_at = ?2 WHERE subscription_code = ?3",
    )
    .bind(DonationStatus::Cancelled.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(subscription_code)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ─────────────────────────────────────────────────────────
// Donation reads
// ─────────────────────────────────────────────────────────

pub async fn donation_by_reference(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Option<DonationRecord>> {
    let row = sqlx::query_as::<_, DonationRecord>(
        r#"
        SELECT id, donor_name, email, phone, amount, currency, donation_type,
               payment_reference, payment_status, subscription_code,
               gateway_invoice_id, created_at, updated_at
        FROM   donations
        WHERE  payment_reference = ?1
        "#,
    )
    .bind(reference)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All donation rows, newest first (admin reconciliation view).
pub async fn all_donations(pool: &SqlitePool) -> Result<Vec<DonationRecord>> {
    let rows = sqlx::query_as::<_, DonationRecord>(
        r#"
        SELECT id, donor_name, email, phone, amount, currency, donation_type,
               payment_reference, payment_status, subscription_code,
               gateway_invoice_id, created_at, updated_at
        FROM   donations
        ORDER  BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// The amount/type/status projection the metrics aggregation works over.
pub async fn donation_stat_rows(pool: &SqlitePool) -> Result<Vec<StatRow>> {
    let rows = sqlx::query_as::<_, StatRow>(
        "SELECT amount, donation_type, payment_status FROM donations",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Audit log
// ─────────────────────────────────────────────────────────

/// Append an audit entry. Entries are write-once; nothing updates or deletes
/// them.
pub async fn insert_payment_log(
    pool: &SqlitePool,
    reference: &str,
    log_type: LogType,
    request_data: Option<&serde_json::Value>,
    response_data: Option<&serde_json::Value>,
    status_code: Option<i64>,
    error_message: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_logs
            (payment_reference, log_type, request_data, response_data,
             status_code, error_message)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(reference)
    .bind(log_type.as_str())
    .bind(request_data.map(|v| v.to_string()))
    .bind(response_data.map(|v| v.to_string()))
    .bind(status_code)
    .bind(error_message)
    .execute(pool)
    .await?;
    Ok(())
}

/// Audit entries for one reference, oldest first.
pub async fn logs_for_reference(
    pool: &SqlitePool,
    reference: &str,
) -> Result<Vec<PaymentLogRecord>> {
    let rows = sqlx::query_as::<_, PaymentLogRecord>(
        r#"
        SELECT id, payment_reference, log_type, request_data, response_data,
               status_code, error_message, created_at
        FROM   payment_logs
        WHERE  payment_reference = ?1
        ORDER  BY id ASC
        "#,
    )
    .bind(reference)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────
// Site events
// ─────────────────────────────────────────────────────────

/// All site events, ordered by start time ascending.
pub async fn all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, title, description, location, starts_at, image_url, created_at
        FROM   events
        ORDER  BY starts_at ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
