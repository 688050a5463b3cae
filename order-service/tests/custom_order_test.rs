//! Custom order intake integration tests.

mod common;

use common::{CASHIER_ID, CUSTOMER_ID, TestApp};

fn order_form(item_type: &str, quantity: &str, payment_option: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("customer_name", "Asha Perera".to_string())
        .text("item_type", item_type.to_string())
        .text("quantity", quantity.to_string())
        .text("service_charge", "100.00".to_string())
        .text("payment_option", payment_option.to_string())
}

#[tokio::test]
async fn intake_prices_from_the_rate_table() {
    let Some(app) = TestApp::spawn().await else { return };

    // 10 medals at 450.00 plus 100.00 service charge, paid in full.
    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("medal", "10", "full"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["unit_price"], "450.00");
    assert_eq!(body["total_amount"], "4600.00");
    assert_eq!(body["amount_paid"], "4600.00");
    assert_eq!(body["payment_status"], "completed");

    let request_id = body["request_id"].as_str().expect("Missing request id");
    assert!(request_id.starts_with("CC"), "request id: {}", request_id);
}

#[tokio::test]
async fn advance_option_collects_thirty_percent() {
    let Some(app) = TestApp::spawn().await else { return };

    // 10 badges at 50.00 plus 100.00 service charge = 600.00; advance 180.00.
    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("badge", "10", "advance"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    assert_eq!(body["total_amount"], "600.00");
    assert_eq!(body["amount_paid"], "180.00");
    assert_eq!(body["payment_status"], "partially_paid");
}

#[tokio::test]
async fn request_ids_are_sequential_and_unique() {
    let Some(app) = TestApp::spawn().await else { return };

    let mut ids = Vec::new();
    for _ in 0..3 {
        let response = app
            .post("/custom-orders", CASHIER_ID, "cashier")
            .multipart(order_form("mug", "1", "full"))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.expect("Invalid body");
        ids.push(body["request_id"].as_str().expect("Missing id").to_string());
    }

    assert_eq!(ids, vec!["CC001", "CC002", "CC003"]);
}

#[tokio::test]
async fn concurrent_intakes_get_distinct_ids() {
    let Some(app) = TestApp::spawn().await else { return };

    let a = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("souvenir", "1", "full"))
        .send();
    let b = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("souvenir", "1", "full"))
        .send();

    let (a, b) = tokio::join!(a, b);
    let a: serde_json::Value = a.expect("Request failed").json().await.expect("Invalid body");
    let b: serde_json::Value = b.expect("Request failed").json().await.expect("Invalid body");

    assert_ne!(a["request_id"], b["request_id"]);
}

#[tokio::test]
async fn design_files_are_stored_and_listed() {
    let Some(app) = TestApp::spawn().await else { return };

    let form = order_form("medal", "2", "full").part(
        "design_files",
        reqwest::multipart::Part::bytes(b"fake png bytes".to_vec())
            .file_name("crest.png")
            .mime_str("image/png")
            .expect("Invalid mime"),
    );

    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(form)
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid body");
    let request_id = body["request_id"].as_str().expect("Missing id").to_string();
    let files = body["design_files"].as_array().expect("files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["file_name"], "crest.png");

    // Stored file exists on disk where the record points.
    let stored_path = files[0]["stored_path"].as_str().expect("path");
    let contents = tokio::fs::read(stored_path).await.expect("Stored file missing");
    assert_eq!(contents, b"fake png bytes");

    let detail: serde_json::Value = app
        .get(&format!("/custom-orders/{}", request_id), CASHIER_ID, "cashier")
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("Invalid body");
    assert_eq!(detail["design_files"].as_array().expect("files").len(), 1);
}

#[tokio::test]
async fn unknown_item_type_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("trophy", "1", "full"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn zero_quantity_is_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(order_form("mug", "0", "full"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let Some(app) = TestApp::spawn().await else { return };

    let form = reqwest::multipart::Form::new()
        .text("customer_name", "Asha Perera".to_string())
        .text("item_type", "mug".to_string());

    let response = app
        .post("/custom-orders", CASHIER_ID, "cashier")
        .multipart(form)
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn customers_can_place_their_own_orders() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .post("/custom-orders", CUSTOMER_ID, "customer")
        .multipart(order_form("mug", "1", "full"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn browsing_orders_is_staff_only() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .get("/custom-orders", CUSTOMER_ID, "customer")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn missing_custom_order_is_not_found() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .get("/custom-orders/CC999", CASHIER_ID, "cashier")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(response.status().as_u16(), 404);
}
