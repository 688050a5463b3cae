//! Payment record model for order-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One applied payment against an invoice. The invoice aggregate and this
/// audit row are written in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: Option<String>,
    pub recorded_utc: DateTime<Utc>,
}
