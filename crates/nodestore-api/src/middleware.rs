//! Middleware: request accounting.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::Metrics;

/// Count every request by method and final status.
pub async fn track_requests(
    State(metrics): State<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let response = next.run(request).await;

    metrics
        .http_requests
        .with_label_values(&[method.as_str(), response.status().as_str()])
        .inc();

    response
}
