//! Prometheus metrics for order-service.

use once_cell::sync::Lazy;
use prometheus::{
    CounterVec, HistogramVec, TextEncoder, register_counter_vec, register_histogram_vec,
};

/// Quotation counter by status.
pub static QUOTATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "order_quotations_total",
        "Total number of quotations by status",
        &["status"] // pending, approved, rejected
    )
    .expect("Failed to register quotations_total")
});

/// Invoice counter.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "order_invoices_total",
        "Total number of invoices by payment status",
        &["payment_status"]
    )
    .expect("Failed to register invoices_total")
});

/// Payment counter and amount.
pub static PAYMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "order_payments_total",
        "Total number of recorded payments",
        &["result"] // applied, rejected
    )
    .expect("Failed to register payments_total")
});

pub static PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "order_payment_amount_total",
        "Total applied payment amount",
        &["kind"] // invoice, custom_order
    )
    .expect("Failed to register payment_amount_total")
});

/// Custom order intake counter by item type.
pub static CUSTOM_ORDERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "order_custom_orders_total",
        "Total number of custom order requests by item type",
        &["item_type"]
    )
    .expect("Failed to register custom_orders_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "order_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&QUOTATIONS_TOTAL);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&PAYMENTS_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
    Lazy::force(&CUSTOM_ORDERS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
