use crate::dtos::{CreateQuotationRequest, QuotationDecisionRequest};
use crate::models::{CreateQuotation, QuotationStatus};
use crate::services::metrics::QUOTATIONS_TOTAL;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};
use uuid::Uuid;
use validator::Validate;

/// Customers file quotations for themselves; staff may file one on a
/// customer's behalf by passing `customer_id`.
pub async fn create_quotation(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateQuotationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer_id = match identity.role {
        Role::Customer => identity.user_uuid()?,
        _ => payload
            .customer_id
            .ok_or_else(|| AppError::validation("customer_id", "Customer id is required"))?,
    };

    let quotation = state
        .db
        .create_quotation(&CreateQuotation {
            customer_id,
            description: payload.description,
            want_date: payload.want_date,
        })
        .await?;

    QUOTATIONS_TOTAL.with_label_values(&["pending"]).inc();

    Ok((StatusCode::CREATED, Json(quotation)))
}

/// Staff see every quotation; customers only their own.
pub async fn list_quotations(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    let scope = match identity.role {
        Role::Customer => Some(identity.user_uuid()?),
        _ => None,
    };

    let quotations = state.db.list_quotations(scope).await?;
    Ok(Json(quotations))
}

pub async fn get_quotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(quotation_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quotation = state
        .db
        .get_quotation(quotation_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Quotation {} not found", quotation_id)))?;

    if identity.role == Role::Customer && quotation.customer_id != identity.user_uuid()? {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Quotation {} does not belong to this customer",
            quotation_id
        )));
    }

    Ok(Json(quotation))
}

/// Approve or reject a pending quotation. Approval creates the job;
/// repeating a decision yields a conflict.
pub async fn decide_quotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(quotation_id): Path<Uuid>,
    Json(payload): Json<QuotationDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    let status = QuotationStatus::parse(&payload.status)
        .filter(|s| *s != QuotationStatus::Pending)
        .ok_or_else(|| {
            AppError::validation("status", "Status must be 'approved' or 'rejected'")
        })?;

    let (quotation, job) = state.db.set_quotation_status(quotation_id, status).await?;

    QUOTATIONS_TOTAL.with_label_values(&[status.as_str()]).inc();

    Ok(Json(serde_json::json!({
        "quotation": quotation,
        "job": job,
    })))
}
