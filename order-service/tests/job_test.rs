//! Job tracking integration tests.

mod common;

use common::{CUSTOMER_ID, SUPERVISOR_ID, TestApp};

#[tokio::test]
async fn job_schedule_and_status_can_be_updated() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let response = app
        .put(&format!("/jobs/{}", job_id), SUPERVISOR_ID, "supervisor")
        .json(&serde_json::json!({
            "start_date": "2026-09-01",
            "finish_date": "2026-09-20",
            "status": "in_progress"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["start_date"], "2026-09-01");
    assert_eq!(body["finish_date"], "2026-09-20");
}

#[tokio::test]
async fn finish_date_cannot_precede_start_date() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let response = app
        .put(&format!("/jobs/{}", job_id), SUPERVISOR_ID, "supervisor")
        .json(&serde_json::json!({
            "start_date": "2026-09-20",
            "finish_date": "2026-09-01",
            "status": "completed"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn open_jobs_may_omit_the_finish_date() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let response = app
        .put(&format!("/jobs/{}", job_id), SUPERVISOR_ID, "supervisor")
        .json(&serde_json::json!({
            "start_date": "2026-09-01",
            "status": "in_progress"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert!(body["finish_date"].is_null());
}

#[tokio::test]
async fn free_form_status_strings_are_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let response = app
        .put(&format!("/jobs/{}", job_id), SUPERVISOR_ID, "supervisor")
        .json(&serde_json::json!({
            "start_date": "2026-09-01",
            "status": "In Progress"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn updating_jobs_is_not_for_customers() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let response = app
        .put(&format!("/jobs/{}", job_id), CUSTOMER_ID, "customer")
        .json(&serde_json::json!({
            "start_date": "2026-09-01",
            "status": "completed"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn customer_with_no_jobs_gets_an_empty_list() {
    let Some(app) = TestApp::spawn().await else { return };

    app.approved_quotation().await;

    let other_customer = uuid::Uuid::new_v4().to_string();
    let response = app
        .get("/jobs", &other_customer, "customer")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body.as_array().expect("Expected array").len(), 0);
}

#[tokio::test]
async fn customer_sees_their_own_jobs() {
    let Some(app) = TestApp::spawn().await else { return };

    let (_, job_id) = app.approved_quotation().await;

    let body: serde_json::Value = app
        .get("/jobs", CUSTOMER_ID, "customer")
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    let jobs = body.as_array().expect("Expected array");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["job_id"], job_id.as_str());
}

#[tokio::test]
async fn staff_can_filter_jobs_by_customer() {
    let Some(app) = TestApp::spawn().await else { return };

    app.approved_quotation().await;

    let body: serde_json::Value = app
        .get(
            &format!("/jobs?customer_id={}", CUSTOMER_ID),
            SUPERVISOR_ID,
            "supervisor",
        )
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(body.as_array().expect("Expected array").len(), 1);

    let none: serde_json::Value = app
        .get(
            &format!("/jobs?customer_id={}", uuid::Uuid::new_v4()),
            SUPERVISOR_ID,
            "supervisor",
        )
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(none.as_array().expect("Expected array").len(), 0);
}

#[tokio::test]
async fn updating_a_missing_job_is_not_found() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .put(&format!("/jobs/{}", uuid::Uuid::new_v4()), SUPERVISOR_ID, "supervisor")
        .json(&serde_json::json!({
            "start_date": "2026-09-01",
            "status": "completed"
        }))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 404);
}
