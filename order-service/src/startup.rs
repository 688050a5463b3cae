use crate::config::Config;
use crate::handlers;
use crate::services::{Database, DesignFileStore};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub files: DesignFileStore,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;

        let files = DesignFileStore::new(&config.uploads.dir);

        let state = AppState {
            config: config.clone(),
            db,
            files,
        };

        let app = router(state.clone());

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid bind address: {}", e)))?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::readiness))
        .route("/metrics", get(handlers::health::metrics))
        .route(
            "/quotations",
            post(handlers::quotations::create_quotation)
                .get(handlers::quotations::list_quotations),
        )
        .route("/quotations/:id", get(handlers::quotations::get_quotation))
        .route(
            "/quotations/:id/status",
            put(handlers::quotations::decide_quotation),
        )
        .route("/jobs", get(handlers::jobs::list_jobs))
        .route(
            "/jobs/:id",
            get(handlers::jobs::get_job).put(handlers::jobs::update_job),
        )
        .route(
            "/invoices",
            post(handlers::invoices::create_invoice).get(handlers::invoices::list_invoices),
        )
        .route("/invoices/:id", get(handlers::invoices::get_invoice))
        .route(
            "/invoices/:id/payments",
            post(handlers::invoices::record_payment)
                .get(handlers::invoices::list_invoice_payments),
        )
        .route(
            "/invoices/:id/approval",
            put(handlers::invoices::decide_approval),
        )
        .route(
            "/materials",
            post(handlers::catalog::create_material).get(handlers::catalog::list_materials),
        )
        .route(
            "/materials/:id",
            get(handlers::catalog::get_material)
                .put(handlers::catalog::update_material)
                .delete(handlers::catalog::delete_material),
        )
        .route(
            "/materials/:id/quantity",
            put(handlers::catalog::update_material_quantity),
        )
        .route(
            "/materials/:id/consume",
            post(handlers::catalog::consume_material),
        )
        .route(
            "/machines",
            post(handlers::catalog::create_machine).get(handlers::catalog::list_machines),
        )
        .route(
            "/machines/:id",
            put(handlers::catalog::update_machine).delete(handlers::catalog::delete_machine),
        )
        .route(
            "/custom-orders",
            post(handlers::custom_orders::create_custom_order)
                .get(handlers::custom_orders::list_custom_orders),
        )
        .route(
            "/custom-orders/:id",
            get(handlers::custom_orders::get_custom_order),
        )
        .route("/reports/inventory", get(handlers::reports::inventory_report))
        .route(
            "/reports/inventory/download",
            get(handlers::reports::inventory_download),
        )
        .route("/reports/sales", get(handlers::reports::sales_report))
        .route(
            "/reports/sales/download",
            get(handlers::reports::sales_download),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
