use axum::response::IntoResponse;

use crate::services::metrics::get_metrics;

/// Prometheus text exposition endpoint.
pub async fn metrics() -> impl IntoResponse {
    get_metrics()
}
