use crate::dtos::{
    ApprovalDecisionRequest, CreateInvoiceRequest, InvoiceDetailResponse, InvoiceResponse,
    PaymentRequest,
};
use crate::models::{CreateInvoice, CreateLineItem, CustomerApproval};
use crate::services::metrics::{INVOICES_TOTAL, PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};
use uuid::Uuid;
use validator::Validate;

/// Raise an invoice against a quotation. The invoice row and every line
/// item land in one transaction.
pub async fn create_invoice(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;
    payload.validate()?;

    if payload.total_amount <= Decimal::ZERO {
        return Err(AppError::validation(
            "total_amount",
            "Invoice total must be greater than zero",
        ));
    }
    for line in &payload.line_items {
        if line.unit_price < Decimal::ZERO {
            return Err(AppError::validation(
                "unit_price",
                "Unit price cannot be negative",
            ));
        }
    }

    let (invoice, line_items) = state
        .db
        .create_invoice(&CreateInvoice {
            quotation_id: payload.quotation_id,
            total_amount: payload.total_amount,
            line_items: payload
                .line_items
                .into_iter()
                .map(|l| CreateLineItem {
                    material_name: l.material_name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
        })
        .await?;

    INVOICES_TOTAL.with_label_values(&["pending"]).inc();

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse {
            invoice,
            line_items,
        }),
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let invoices = state.db.list_invoices().await?;
    Ok(Json(invoices))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier, Role::Customer])?;

    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id)))?;
    let line_items = state.db.get_invoice_items(invoice_id).await?;
    let payments = state.db.list_payments(invoice_id).await?;

    Ok(Json(InvoiceDetailResponse {
        invoice,
        line_items,
        payments,
    }))
}

/// Record a payment. Overpayment is rejected with a conflict; the paid
/// amount and derived status move atomically.
pub async fn record_payment(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Cashier])?;

    if payload.amount <= Decimal::ZERO {
        return Err(AppError::validation(
            "amount",
            "Payment amount must be greater than zero",
        ));
    }

    let result = state
        .db
        .apply_payment(invoice_id, payload.amount, payload.method)
        .await;

    match &result {
        Ok((invoice, _)) => {
            PAYMENTS_TOTAL.with_label_values(&["applied"]).inc();
            PAYMENT_AMOUNT_TOTAL
                .with_label_values(&["invoice"])
                .inc_by(payload.amount.to_f64().unwrap_or(0.0));
            if invoice.payment_status == "completed" {
                INVOICES_TOTAL.with_label_values(&["completed"]).inc();
            }
        }
        Err(AppError::Conflict(_)) => {
            PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
        }
        Err(_) => {}
    }

    let (invoice, payment) = result?;

    Ok(Json(serde_json::json!({
        "invoice": invoice,
        "payment": payment,
    })))
}

pub async fn list_invoice_payments(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id)))?;

    let payments = state.db.list_payments(invoice_id).await?;
    Ok(Json(payments))
}

/// The customer's one-time accept/cancel decision on an invoice.
/// Cancelling also cancels the job created from the quotation.
pub async fn decide_approval(
    State(state): State<AppState>,
    identity: Identity,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<ApprovalDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Customer, Role::Admin])?;
    payload.validate()?;

    let decision = CustomerApproval::parse(&payload.decision)
        .filter(|d| *d != CustomerApproval::Pending)
        .ok_or_else(|| {
            AppError::validation("decision", "Decision must be 'approved' or 'cancelled'")
        })?;

    let invoice = state.db.set_customer_approval(invoice_id, decision).await?;

    Ok(Json(invoice))
}
