//! Job model for order-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Job status. Staff workflows legitimately move jobs backwards (rework),
/// so no transition order is imposed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "in_progress" => Some(JobStatus::InProgress),
            "completed" => Some(JobStatus::Completed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

/// Job row. Created only when a quotation is approved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: Uuid,
    pub quotation_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub finish_date: Option<NaiveDate>,
    pub status: String,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

/// Input for updating a job's schedule and status.
#[derive(Debug, Clone)]
pub struct UpdateJob {
    pub start_date: NaiveDate,
    pub finish_date: Option<NaiveDate>,
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn parse_rejects_free_form_strings() {
        assert_eq!(JobStatus::parse("In Progress"), None);
        assert_eq!(JobStatus::parse("done"), None);
    }
}
