use order_service::config::{Config, DatabaseConfig, ServerConfig, UploadsConfig};
use order_service::startup::Application;
use secrecy::Secret;
use uuid::Uuid;

pub const ADMIN_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const SUPERVISOR_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const CASHIER_ID: &str = "33333333-3333-3333-3333-333333333333";
pub const CUSTOMER_ID: &str = "44444444-4444-4444-4444-444444444444";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    _uploads: tempfile::TempDir,
}

impl TestApp {
    /// Spawn the service against a fresh per-test database. Returns `None`
    /// when `TEST_DATABASE_URL` is not set so the suite can run without a
    /// local PostgreSQL.
    pub async fn spawn() -> Option<Self> {
        let Ok(admin_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return None;
        };

        let db_name = format!("order_test_{}", Uuid::new_v4().simple());
        let admin_pool = sqlx::PgPool::connect(&admin_url)
            .await
            .expect("Failed to connect to test PostgreSQL");
        sqlx::query(&format!(r#"CREATE DATABASE "{}""#, db_name))
            .execute(&admin_pool)
            .await
            .expect("Failed to create test database");

        // Same server, new database.
        let base = admin_url
            .rsplit_once('/')
            .map(|(base, _)| base.to_string())
            .expect("TEST_DATABASE_URL must include a database path");
        let db_url = format!("{}/{}", base, db_name);

        let uploads = tempfile::tempdir().expect("Failed to create uploads dir");

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections: 5,
                min_connections: 1,
            },
            uploads: UploadsConfig {
                dir: uploads.path().to_string_lossy().into_owned(),
            },
            service_name: "order-service".to_string(),
            log_level: "warn".to_string(),
            otlp_endpoint: None,
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address,
            port,
            client,
            _uploads: uploads,
        })
    }

    pub fn get(&self, path: &str, user_id: &str, role: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-User-Id", user_id)
            .header("X-User-Role", role)
    }

    pub fn post(&self, path: &str, user_id: &str, role: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.address, path))
            .header("X-User-Id", user_id)
            .header("X-User-Role", role)
    }

    pub fn put(&self, path: &str, user_id: &str, role: &str) -> reqwest::RequestBuilder {
        self.client
            .put(format!("{}{}", self.address, path))
            .header("X-User-Id", user_id)
            .header("X-User-Role", role)
    }

    pub fn delete(&self, path: &str, user_id: &str, role: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(format!("{}{}", self.address, path))
            .header("X-User-Id", user_id)
            .header("X-User-Role", role)
    }

    /// Create a quotation as the test customer and return its id.
    pub async fn create_quotation(&self) -> String {
        let response = self
            .post("/quotations", CUSTOMER_ID, "customer")
            .json(&serde_json::json!({
                "description": "50 engraved brass medals",
                "want_date": "2026-10-01"
            }))
            .send()
            .await
            .expect("Failed to create quotation");
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.expect("Invalid quotation body");
        body["quotation_id"].as_str().expect("Missing id").to_string()
    }

    /// Create a quotation and approve it, returning (quotation_id, job_id).
    pub async fn approved_quotation(&self) -> (String, String) {
        let quotation_id = self.create_quotation().await;
        let response = self
            .put(
                &format!("/quotations/{}/status", quotation_id),
                SUPERVISOR_ID,
                "supervisor",
            )
            .json(&serde_json::json!({ "status": "approved" }))
            .send()
            .await
            .expect("Failed to approve quotation");
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.expect("Invalid decision body");
        let job_id = body["job"]["job_id"].as_str().expect("Missing job").to_string();
        (quotation_id, job_id)
    }

    /// Create an invoice against a quotation with one line item covering
    /// the whole total. Returns the invoice id.
    pub async fn create_invoice(&self, quotation_id: &str, total_amount: &str) -> String {
        let response = self
            .post("/invoices", CASHIER_ID, "cashier")
            .json(&serde_json::json!({
                "quotation_id": quotation_id,
                "total_amount": total_amount,
                "line_items": [
                    { "material_name": "Brass medal", "quantity": 1, "unit_price": total_amount }
                ]
            }))
            .send()
            .await
            .expect("Failed to create invoice");
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.expect("Invalid invoice body");
        body["invoice_id"].as_str().expect("Missing id").to_string()
    }
}
