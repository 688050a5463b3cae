//! Health, readiness and metrics endpoint tests.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works_without_identity_headers() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_reports_database_connectivity() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .client
        .get(format!("{}/ready", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let Some(app) = TestApp::spawn().await else { return };

    // Generate at least one request so the HTTP counters exist.
    app.client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Request failed");

    let response = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.expect("Invalid body");
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "test-request-42")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("test-request-42")
    );
}
