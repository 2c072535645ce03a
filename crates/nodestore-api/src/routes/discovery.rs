//! Discovery endpoints: describe what lives under `/` and `/api/v1/`.

use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

const SERVICE_ID: &str = "object store (node data)";

#[derive(Serialize)]
struct ResourceResponse {
    id: &'static str,
    available_resources: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'static str>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/api/v1", get(api_v1))
        .route("/api/v1/", get(api_v1))
}

async fn root() -> Json<ResourceResponse> {
    Json(ResourceResponse {
        id: SERVICE_ID,
        available_resources: vec!["api/v1/"],
        version: Some(env!("CARGO_PKG_VERSION")),
    })
}

async fn api_v1() -> Json<ResourceResponse> {
    Json(ResourceResponse {
        id: SERVICE_ID,
        available_resources: vec!["data/"],
        version: None,
    })
}
