//! # nodestore-api
//!
//! HTTP layer for nodestore: the data download routes, discovery endpoints and
//! Prometheus metrics, wired onto a single axum router.

pub mod auth;
pub mod metrics;
pub mod middleware;
pub mod routes;

use axum::Router;
use nodestore_common::config::DownloadMode;
use nodestore_common::StoreError;
use nodestore_policy::Authenticator;
use nodestore_storage::ObjectStore;
use std::sync::Arc;
use std::time::Duration;

pub use metrics::Metrics;

/// Per-deployment settings for the data routes.
#[derive(Debug, Clone)]
pub struct DataSettings {
    /// Key prefix for every object.
    pub root_folder: String,
    pub download_mode: DownloadMode,
    /// Lifetime of presigned URLs in redirect mode.
    pub presign_ttl: Duration,
    /// Domain advertised in the `WWW-Authenticate` challenge.
    pub auth_domain: String,
}

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Object storage holding the node data.
    pub store: Arc<dyn ObjectStore>,
    /// Access decision for every data request.
    pub authenticator: Arc<dyn Authenticator>,
    pub metrics: Metrics,
    pub settings: DataSettings,
}

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api_routes = Router::new().merge(routes::data::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(routes::discovery::router())
        .merge(routes::metrics::router())
        .fallback(|| async { StoreError::UnknownResource })
        .method_not_allowed_fallback(|| async {
            StoreError::Status(axum::http::StatusCode::METHOD_NOT_ALLOWED)
        })
        .layer(axum::middleware::from_fn_with_state(
            metrics,
            middleware::track_requests,
        ))
        // Storage is read only, so any origin may read it.
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::HEAD,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
