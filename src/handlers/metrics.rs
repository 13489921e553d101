use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::instrument;

use crate::models::MessageResponse;
use crate::observability::{Metrics, MetricsError};

/// Prometheus text exposition of the service registry
#[instrument(name = "metrics_handler", skip(metrics))]
pub async fn metrics_handler(
    State(metrics): State<Arc<Metrics>>,
) -> Result<impl IntoResponse, MetricsError> {
    let exposition = metrics.encode()?;

    Ok((
        [
            (header::CONTENT_TYPE, prometheus::TEXT_FORMAT),
            (header::CACHE_CONTROL, "no-store"),
        ],
        exposition,
    ))
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        crate::error_with_trace!(error = %self, "Metrics exposition failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(MessageResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
