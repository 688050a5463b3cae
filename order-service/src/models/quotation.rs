//! Quotation model for order-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Quotation status. Transitions are one-time edges: a pending quotation
/// becomes approved or rejected exactly once, then is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Pending,
    Approved,
    Rejected,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Approved => "approved",
            QuotationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QuotationStatus::Pending),
            "approved" => Some(QuotationStatus::Approved),
            "rejected" => Some(QuotationStatus::Rejected),
            _ => None,
        }
    }

    /// Whether this status can still transition to `next`.
    pub fn can_transition_to(&self, next: QuotationStatus) -> bool {
        matches!(
            (self, next),
            (
                QuotationStatus::Pending,
                QuotationStatus::Approved | QuotationStatus::Rejected
            )
        )
    }
}

/// Quotation row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    pub quotation_id: Uuid,
    pub customer_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub status: String,
    pub want_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a quotation.
#[derive(Debug, Clone)]
pub struct CreateQuotation {
    pub customer_id: Uuid,
    pub description: String,
    pub want_date: Option<NaiveDate>,
}
