//! Report integration tests.

mod common;

use common::{CASHIER_ID, CUSTOMER_ID, SUPERVISOR_ID, TestApp};

#[tokio::test]
async fn sales_report_sums_invoiced_and_collected() {
    let Some(app) = TestApp::spawn().await else { return };

    let (quotation_id, _) = app.approved_quotation().await;
    let invoice_id = app.create_invoice(&quotation_id, "1000.00").await;
    let paid = app
        .post(&format!("/invoices/{}/payments", invoice_id), CASHIER_ID, "cashier")
        .json(&serde_json::json!({ "amount": "400.00" }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(paid.status().as_u16(), 200);

    let report: serde_json::Value = app
        .get("/reports/sales", SUPERVISOR_ID, "supervisor")
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(report["invoice_count"], 1);
    assert_eq!(report["total_invoiced"], "1000.00");
    assert_eq!(report["total_collected"], "400.00");
    assert_eq!(report["total_outstanding"], "600.00");
}

#[tokio::test]
async fn sales_report_period_excludes_other_days() {
    let Some(app) = TestApp::spawn().await else { return };

    let (quotation_id, _) = app.approved_quotation().await;
    app.create_invoice(&quotation_id, "100.00").await;

    // A window entirely in the past sees nothing.
    let report: serde_json::Value = app
        .get(
            "/reports/sales?start_date=2020-01-01&end_date=2020-12-31",
            SUPERVISOR_ID,
            "supervisor",
        )
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");

    assert_eq!(report["invoice_count"], 0);
    assert_eq!(report["total_invoiced"], "0");
}

#[tokio::test]
async fn inverted_period_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .get(
            "/reports/sales?start_date=2026-06-30&end_date=2026-06-01",
            SUPERVISOR_ID,
            "supervisor",
        )
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn csv_report_downloads_as_attachment() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .get("/reports/inventory/download", SUPERVISOR_ID, "supervisor")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
    assert!(response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .contains("attachment"));

    let body = response.text().await.expect("Invalid body");
    assert!(body.starts_with("item_id,item_name,available_qty"));
}

#[tokio::test]
async fn unsupported_report_formats_are_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    for format in ["pdf", "xlsx"] {
        let response = app
            .get(
                &format!("/reports/inventory/download?format={}", format),
                SUPERVISOR_ID,
                "supervisor",
            )
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status().as_u16(), 400, "format {}", format);
    }
}

#[tokio::test]
async fn reports_are_not_for_cashiers_or_customers() {
    let Some(app) = TestApp::spawn().await else { return };

    for (user, role) in [(CASHIER_ID, "cashier"), (CUSTOMER_ID, "customer")] {
        let response = app
            .get("/reports/sales", user, role)
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status().as_u16(), 403, "role {}", role);
    }
}
