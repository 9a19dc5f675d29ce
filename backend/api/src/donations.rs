//! Donation domain types shared by the handlers, the storage layer, and the
//! gateway clients.

use serde::{Deserialize, Serialize};

/// Lifecycle states of a donation row.
///
/// `Pending`, `Paid`, `Failed` and `Cancelled` belong to the aggregator flow:
/// the row is created at intake and updated by reference as callbacks arrive.
/// `Successful` is written by the hosted-checkout webhook, which only learns
/// about a donation after the charge settled and therefore inserts a finished
/// row instead of updating a pending one. The two flows are deliberately
/// kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Successful,
}

impl DonationStatus {
    /// Identifier string stored in the `payment_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Successful => "successful",
        }
    }
}

/// Audit-log entry kinds written alongside gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    InitiateRequest,
    InitiateResponse,
    Verification,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitiateRequest => "initiate_request",
            Self::InitiateResponse => "initiate_response",
            Self::Verification => "verification",
        }
    }
}

/// A donation row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub donor_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub amount: f64,
    pub currency: String,
    /// `one-time` or `recurring`
    pub donation_type: String,
    pub payment_reference: String,
    pub payment_status: DonationStatus,
    pub subscription_code: Option<String>,
}

/// A donation row as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationRecord {
    pub id: i64,
    pub donor_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub donation_type: String,
    pub payment_reference: String,
    pub payment_status: String,
    pub subscription_code: Option<String>,
    pub gateway_invoice_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// The amount/type/status projection the metrics aggregation reads.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatRow {
    pub amount: f64,
    pub donation_type: String,
    pub payment_status: String,
}

/// Aggregate counters shown on the donation stats widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationMetrics {
    pub total_donations: usize,
    pub total_amount: f64,
    pub successful: usize,
    pub failed: usize,
    pub recurring_count: usize,
}

/// Fold donation rows into summary counters.
///
/// Status matching is substring-based because the two payment flows write
/// different success markers ("paid" vs "successful").
pub fn aggregate_metrics(rows: &[StatRow]) -> DonationMetrics {
    let mut metrics = DonationMetrics {
        total_donations: rows.len(),
        total_amount: 0.0,
        successful: 0,
        failed: 0,
        recurring_count: 0,
    };

    for row in rows {
        metrics.total_amount += row.amount;

        let status = row.payment_status.to_lowercase();
        if status.contains("success") || status == "paid" {
            metrics.successful += 1;
        }
        if status.contains("fail") {
            metrics.failed += 1;
        }

        let kind = row.donation_type.to_lowercase();
        if kind.contains("recurring") || kind.contains("subscription") {
            metrics.recurring_count += 1;
        }
    }

    metrics
}

/// A site event row (Events page listing).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// A payment audit-log row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentLogRecord {
    pub id: i64,
    pub payment_reference: String,
    pub log_type: String,
    pub request_data: Option<String>,
    pub response_data: Option<String>,
    pub status_code: Option<i64>,
    pub error_message: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(amount: f64, donation_type: &str, payment_status: &str) -> StatRow {
        StatRow {
            amount,
            donation_type: donation_type.to_string(),
            payment_status: payment_status.to_string(),
        }
    }

    #[test]
    fn metrics_count_statuses() {
        let rows = vec![
            row(100.0, "one-time", "paid"),
            row(25.0, "one-time", "paid"),
            row(10.0, "one-time", "failed"),
            row(5.0, "one-time", "pending"),
        ];

        let metrics = aggregate_metrics(&rows);
        assert_eq!(metrics.total_donations, 4);
        assert_eq!(metrics.total_amount, 140.0);
        assert_eq!(metrics.successful, 2);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.recurring_count, 0);
    }

    #[test]
    fn metrics_treat_successful_and_paid_alike() {
        let rows = vec![
            row(50.0, "recurring", "successful"),
            row(50.0, "one-time", "paid"),
        ];

        let metrics = aggregate_metrics(&rows);
        assert_eq!(metrics.successful, 2);
        assert_eq!(metrics.recurring_count, 1);
    }

    #[test]
    fn metrics_count_subscription_types_as_recurring() {
        let rows = vec![
            row(20.0, "subscription", "successful"),
            row(20.0, "Recurring", "cancelled"),
            row(20.0, "one-time", "paid"),
        ];

        assert_eq!(aggregate_metrics(&rows).recurring_count, 2);
    }

    #[test]
    fn metrics_on_empty_store() {
        let metrics = aggregate_metrics(&[]);
        assert_eq!(metrics.total_donations, 0);
        assert_eq!(metrics.total_amount, 0.0);
    }

    #[test]
    fn status_strings() {
        assert_eq!(DonationStatus::Pending.as_str(), "pending");
        assert_eq!(DonationStatus::Paid.as_str(), "paid");
        assert_eq!(DonationStatus::Failed.as_str(), "failed");
        assert_eq!(DonationStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(DonationStatus::Successful.as_str(), "successful");
    }

    #[test]
    fn log_type_strings() {
        assert_eq!(LogType::InitiateRequest.as_str(), "initiate_request");
        assert_eq!(LogType::InitiateResponse.as_str(), "initiate_response");
        assert_eq!(LogType::Verification.as_str(), "verification");
    }
}
