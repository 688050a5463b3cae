//! Invoice line item model for order-service.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item row. Immutable once created; owned by exactly one invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub material_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Input for a line item on a new invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLineItem {
    pub material_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}
