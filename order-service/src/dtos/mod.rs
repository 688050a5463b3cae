use crate::models::{
    CustomOrder, DesignFile, Invoice, InvoiceItem, Material, MaterialImage, Payment,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub want_date: Option<NaiveDate>,

    /// Staff may file a quotation on a customer's behalf; customers always
    /// get their own id from the gateway identity.
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuotationDecisionRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJobRequest {
    pub start_date: NaiveDate,
    pub finish_date: Option<NaiveDate>,

    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LineItemRequest {
    #[validate(length(min = 1, message = "Material name is required"))]
    pub material_name: String,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,

    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub quotation_id: Uuid,

    pub total_amount: Decimal,

    #[validate(length(min = 1, message = "At least one line item is required"))]
    #[validate(nested)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApprovalDecisionRequest {
    #[validate(length(min = 1, message = "Decision is required"))]
    pub decision: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[validate(length(min = 1, message = "Item id is required"))]
    pub item_id: String,

    #[validate(length(min = 1, message = "Item name is required"))]
    pub item_name: String,

    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub available_qty: i32,

    pub unit_price: Decimal,

    #[validate(range(min = 0, message = "Preorder level cannot be negative"))]
    pub preorder_level: i32,

    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub available_qty: i32,

    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub available_qty: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConsumeMaterialRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, message = "Machine id is required"))]
    pub machine_id: String,

    #[validate(length(min = 1, message = "Machine name is required"))]
    pub machine_name: String,

    pub hourly_rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMachineRequest {
    pub machine_name: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobListParams {
    /// Staff may scope the list to one customer.
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `json` (default) or `csv`.
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceItem>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceItem>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize)]
pub struct MaterialResponse {
    #[serde(flatten)]
    pub material: Material,
    pub images: Vec<MaterialImage>,
}

#[derive(Debug, Serialize)]
pub struct CustomOrderResponse {
    #[serde(flatten)]
    pub order: CustomOrder,
    pub design_files: Vec<DesignFile>,
}
