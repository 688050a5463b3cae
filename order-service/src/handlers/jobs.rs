use crate::dtos::{JobListParams, UpdateJobRequest};
use crate::models::{JobStatus, UpdateJob};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};
use uuid::Uuid;
use validator::Validate;

/// Staff see every job, optionally filtered to one customer; customers
/// only jobs created from their own quotations. A customer with no jobs
/// gets an empty list, not an error.
pub async fn list_jobs(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<JobListParams>,
) -> Result<impl IntoResponse, AppError> {
    let scope = match identity.role {
        Role::Customer => Some(identity.user_uuid()?),
        _ => params.customer_id,
    };

    let jobs = state.db.list_jobs(scope).await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    identity: Identity,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let job = state
        .db
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job {} not found", job_id)))?;

    if identity.role == Role::Customer && job.customer_id != identity.user_uuid()? {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Job {} does not belong to this customer",
            job_id
        )));
    }

    Ok(Json(job))
}

/// Reschedule a job or move its status. The finish date may be absent
/// while work is still open, but can never precede the start date.
pub async fn update_job(
    State(state): State<AppState>,
    identity: Identity,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    let status = JobStatus::parse(&payload.status).ok_or_else(|| {
        AppError::validation(
            "status",
            "Status must be one of 'pending', 'in_progress', 'completed', 'cancelled'",
        )
    })?;

    if let Some(finish) = payload.finish_date {
        if finish < payload.start_date {
            return Err(AppError::validation(
                "finish_date",
                "Finish date cannot precede start date",
            ));
        }
    }

    let job = state
        .db
        .update_job(
            job_id,
            &UpdateJob {
                start_date: payload.start_date,
                finish_date: payload.finish_date,
                status,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Job {} not found", job_id)))?;

    Ok(Json(job))
}
