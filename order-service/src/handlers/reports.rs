use crate::dtos::ReportParams;
use crate::services::reports::{
    build_inventory_report, build_sales_report, inventory_csv, sales_csv, SalesReport,
};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};

/// Current stock levels with low-stock flags.
pub async fn inventory_report(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;

    let materials = state.db.list_materials().await?;
    Ok(Json(build_inventory_report(&materials)))
}

/// Inventory report as a file download. CSV is rendered here; PDF and
/// XLSX rendering live outside this service.
pub async fn inventory_download(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<ReportParams>,
) -> Result<Response, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    require_csv(&params)?;

    let materials = state.db.list_materials().await?;
    let report = build_inventory_report(&materials);
    Ok(csv_download("inventory_report.csv", inventory_csv(&report)))
}

/// Invoiced, collected and outstanding totals over a date range.
pub async fn sales_report(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<ReportParams>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;

    let report = assemble_sales_report(&state, &params).await?;
    Ok(Json(report))
}

/// Sales report as a file download, CSV only.
pub async fn sales_download(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<ReportParams>,
) -> Result<Response, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    require_csv(&params)?;

    let report = assemble_sales_report(&state, &params).await?;
    Ok(csv_download("sales_report.csv", sales_csv(&report)))
}

async fn assemble_sales_report(
    state: &AppState,
    params: &ReportParams,
) -> Result<SalesReport, AppError> {
    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if end < start {
            return Err(AppError::validation(
                "end_date",
                "End date cannot precede start date",
            ));
        }
    }

    let invoices = state
        .db
        .invoices_in_period(params.start_date, params.end_date)
        .await?;
    Ok(build_sales_report(
        &invoices,
        params.start_date,
        params.end_date,
    ))
}

fn require_csv(params: &ReportParams) -> Result<(), AppError> {
    match params.format.as_deref() {
        None | Some("csv") => Ok(()),
        Some(other) => Err(AppError::BadRequest(anyhow::anyhow!(
            "Unsupported report format '{}': only 'csv' is rendered here",
            other
        ))),
    }
}

fn csv_download(file_name: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}
