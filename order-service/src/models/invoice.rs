//! Invoice model for order-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice payment status. Always a pure function of the paid and total
/// amounts; never set independently of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoicePaymentStatus {
    Pending,
    PartiallyPaid,
    Completed,
}

impl InvoicePaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoicePaymentStatus::Pending => "pending",
            InvoicePaymentStatus::PartiallyPaid => "partially_paid",
            InvoicePaymentStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoicePaymentStatus::Pending),
            "partially_paid" => Some(InvoicePaymentStatus::PartiallyPaid),
            "completed" => Some(InvoicePaymentStatus::Completed),
            _ => None,
        }
    }

    /// Derive the payment status from the paid and total amounts.
    pub fn derive(paid: Decimal, total: Decimal) -> Self {
        if paid >= total {
            InvoicePaymentStatus::Completed
        } else if paid > Decimal::ZERO {
            InvoicePaymentStatus::PartiallyPaid
        } else {
            InvoicePaymentStatus::Pending
        }
    }
}

/// Customer-side decision on an issued invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerApproval {
    Pending,
    Approved,
    Cancelled,
}

impl CustomerApproval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerApproval::Pending => "pending",
            CustomerApproval::Approved => "approved",
            CustomerApproval::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CustomerApproval::Pending),
            "approved" => Some(CustomerApproval::Approved),
            "cancelled" => Some(CustomerApproval::Cancelled),
            _ => None,
        }
    }
}

/// Invoice row. `total_amount` is fixed at creation; `paid_amount` only
/// ever grows, and never past `total_amount`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub quotation_id: Uuid,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: String,
    pub customer_approval_status: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an invoice with its line items.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub quotation_id: Uuid,
    pub total_amount: Decimal,
    pub line_items: Vec<super::CreateLineItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn zero_paid_is_pending() {
        assert_eq!(
            InvoicePaymentStatus::derive(Decimal::ZERO, dec(100_000)),
            InvoicePaymentStatus::Pending
        );
    }

    #[test]
    fn partial_payment_is_partially_paid() {
        assert_eq!(
            InvoicePaymentStatus::derive(dec(40_000), dec(100_000)),
            InvoicePaymentStatus::PartiallyPaid
        );
        assert_eq!(
            InvoicePaymentStatus::derive(dec(1), dec(100_000)),
            InvoicePaymentStatus::PartiallyPaid
        );
        assert_eq!(
            InvoicePaymentStatus::derive(dec(99_999), dec(100_000)),
            InvoicePaymentStatus::PartiallyPaid
        );
    }

    #[test]
    fn full_payment_is_completed() {
        assert_eq!(
            InvoicePaymentStatus::derive(dec(100_000), dec(100_000)),
            InvoicePaymentStatus::Completed
        );
    }

    #[test]
    fn approval_parse_is_closed() {
        assert_eq!(
            CustomerApproval::parse("cancelled"),
            Some(CustomerApproval::Cancelled)
        );
        assert_eq!(CustomerApproval::parse("declined"), None);
        assert_eq!(CustomerApproval::parse("Approved"), None);
    }
}
