//! Custom order request model for order-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Orderable item types with their fixed unit rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Medal,
    Badge,
    Mug,
    Souvenir,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Medal => "medal",
            ItemType::Badge => "badge",
            ItemType::Mug => "mug",
            ItemType::Souvenir => "souvenir",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "medal" => Some(ItemType::Medal),
            "badge" => Some(ItemType::Badge),
            "mug" => Some(ItemType::Mug),
            "souvenir" => Some(ItemType::Souvenir),
            _ => None,
        }
    }

    /// Unit rate from the static price table.
    pub fn unit_price(&self) -> Decimal {
        match self {
            ItemType::Medal => Decimal::new(450_00, 2),
            ItemType::Badge => Decimal::new(50_00, 2),
            ItemType::Mug => Decimal::new(500_00, 2),
            ItemType::Souvenir => Decimal::new(700_00, 2),
        }
    }
}

/// Payment option chosen at intake: full settlement or a 30% advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOption {
    Full,
    Advance,
}

impl PaymentOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOption::Full => "full",
            PaymentOption::Advance => "advance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full" => Some(PaymentOption::Full),
            "advance" => Some(PaymentOption::Advance),
            _ => None,
        }
    }

    /// Amount collected up front for a given order total.
    pub fn amount_paid(&self, total: Decimal) -> Decimal {
        match self {
            PaymentOption::Full => total,
            PaymentOption::Advance => (total * Decimal::new(30, 2)).round_dp(2),
        }
    }
}

/// Priced intake computed from the rate table.
#[derive(Debug, Clone, Copy)]
pub struct OrderPricing {
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
}

/// Price a custom order: rate-table unit price times quantity, plus the
/// service charge, with the upfront amount per the payment option.
pub fn price_order(
    item_type: ItemType,
    quantity: i32,
    service_charge: Decimal,
    option: PaymentOption,
) -> OrderPricing {
    let unit_price = item_type.unit_price();
    let total_amount = unit_price * Decimal::from(quantity) + service_charge;
    OrderPricing {
        unit_price,
        total_amount,
        amount_paid: option.amount_paid(total_amount),
    }
}

/// Format a sequence value as a customer-facing request id. Values past 999
/// keep growing (`CC1000`) rather than wrapping.
pub fn format_request_id(seq: i64) -> String {
    format!("CC{:03}", seq)
}

/// Custom order request row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomOrder {
    pub request_id: String,
    pub customer_name: String,
    pub item_type: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub service_charge: Decimal,
    pub total_amount: Decimal,
    pub payment_option: String,
    pub amount_paid: Decimal,
    pub payment_status: String,
    pub created_utc: DateTime<Utc>,
}

/// Design file attached to a custom order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DesignFile {
    pub file_id: Uuid,
    pub request_id: String,
    pub file_name: String,
    pub stored_path: String,
    pub content_type: Option<String>,
    pub uploaded_utc: DateTime<Utc>,
}

/// Input for creating a custom order.
#[derive(Debug, Clone)]
pub struct CreateCustomOrder {
    pub customer_name: String,
    pub item_type: ItemType,
    pub quantity: i32,
    pub service_charge: Decimal,
    pub payment_option: PaymentOption,
    pub design_files: Vec<NewDesignFile>,
}

/// A design file already persisted to disk, awaiting its database record.
#[derive(Debug, Clone)]
pub struct NewDesignFile {
    pub file_name: String,
    pub stored_path: String,
    pub content_type: Option<String>,
}
