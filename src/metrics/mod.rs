use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use tracing::info;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Webhook metrics
    pub static ref WEBHOOK_EVENTS_TOTAL: IntCounter = IntCounter::new(
        "autopull_webhook_events_total",
        "Total number of webhook events received"
    ).unwrap();

    pub static ref WEBHOOK_EVENTS_SKIPPED: IntCounter = IntCounter::new(
        "autopull_webhook_events_skipped_total",
        "Total number of webhook events skipped by admission policy"
    ).unwrap();

    // Sync metrics
    pub static ref SYNCS_COMPLETED: IntCounter = IntCounter::new(
        "autopull_syncs_completed_total",
        "Total number of image syncs that ran all steps"
    ).unwrap();

    pub static ref SYNCS_TERMINATED_EARLY: IntCounter = IntCounter::new(
        "autopull_syncs_terminated_early_total",
        "Total number of image syncs halted by a failed step"
    ).unwrap();

    // Notification metrics
    pub static ref NOTIFICATIONS_SENT_TOTAL: IntCounter = IntCounter::new(
        "autopull_notifications_sent_total",
        "Total number of notifications accepted by the gateway"
    ).unwrap();

    pub static ref NOTIFICATIONS_FAILED_TOTAL: IntCounter = IntCounter::new(
        "autopull_notifications_failed_total",
        "Total number of failed notification attempts"
    ).unwrap();
}

pub fn register_metrics() {
    REGISTRY
        .register(Box::new(WEBHOOK_EVENTS_TOTAL.clone()))
        .ok();
    REGISTRY
        .register(Box::new(WEBHOOK_EVENTS_SKIPPED.clone()))
        .ok();
    REGISTRY.register(Box::new(SYNCS_COMPLETED.clone())).ok();
    REGISTRY
        .register(Box::new(SYNCS_TERMINATED_EARLY.clone()))
        .ok();
    REGISTRY
        .register(Box::new(NOTIFICATIONS_SENT_TOTAL.clone()))
        .ok();
    REGISTRY
        .register(Box::new(NOTIFICATIONS_FAILED_TOTAL.clone()))
        .ok();

    info!("Metrics registered");
}

pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        );
    }

    match String::from_utf8(buffer) {
        Ok(metrics) => (StatusCode::OK, metrics),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
