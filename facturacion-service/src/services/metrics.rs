//! Prometheus metrics for facturacion-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Invoicing gateway call duration histogram by operation.
pub static GATEWAY_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "facturacion_gateway_request_duration_seconds",
        "Invoicing gateway request duration in seconds",
        &["operation"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register gateway_request_duration")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "facturacion_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Issued document counter by kind.
pub static DOCUMENTOS_EMITIDOS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "facturacion_documentos_emitidos_total",
        "Total number of issued documents by kind",
        &["tipo"] // boleta, nota_credito
    )
    .expect("Failed to register documentos_emitidos_total")
});

/// Saga outcome counter by operation and terminal state.
pub static SAGA_OUTCOMES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "facturacion_saga_outcomes_total",
        "Issuance saga outcomes by operation and terminal state",
        &["operation", "state"] // reconciled, issued_not_notified, issued_not_reconciled, hard_failure
    )
    .expect("Failed to register saga_outcomes_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&GATEWAY_REQUEST_DURATION);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&DOCUMENTOS_EMITIDOS_TOTAL);
    Lazy::force(&SAGA_OUTCOMES_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
