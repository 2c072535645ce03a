//! Node data downloads.
//!
//! GET  /api/v1/data/{job}/{task}/{node}/{timestamp}-{name}: file contents
//! HEAD /api/v1/data/{job}/{task}/{node}/{timestamp}-{name}: size only
//!
//! Each request parses the path, checks access, then asks the object store.
//! GET either streams the object through the gateway or redirects to a
//! presigned URL, depending on the configured download mode.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use futures_util::StreamExt;
use nodestore_common::config::DownloadMode;
use nodestore_common::file_id::FileIdError;
use nodestore_common::{FileIdentity, StoreError, StoreResult};
use nodestore_storage::StorageError;
use std::sync::Arc;

use crate::{auth, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data/", get(missing_path).head(missing_path))
        .route("/data/{*path}", get(get_file).head(head_file))
}

async fn missing_path() -> StoreError {
    FileIdError::InvalidPath(String::new()).into()
}

// ============================================================
// HEAD
// ============================================================

async fn head_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> StoreResult<Response> {
    let file = authorize(&state, &path, &headers)?;
    let key = file.object_key(&state.settings.root_folder);

    let info = state
        .store
        .head_object(&key)
        .await
        .map_err(|e| storage_error(&Method::HEAD, &key, e))?;

    let mut response = StatusCode::OK.into_response();
    let h = response.headers_mut();
    h.insert(header::CONTENT_DISPOSITION, content_disposition(&file)?);
    if let Some(len) = info.content_length {
        h.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    Ok(response)
}

// ============================================================
// GET
// ============================================================

async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> StoreResult<Response> {
    let file = authorize(&state, &path, &headers)?;
    let key = file.object_key(&state.settings.root_folder);
    let disposition = content_disposition(&file)?;

    let mut response = match state.settings.download_mode {
        DownloadMode::Proxy => proxy_object(&state, &key).await?,
        DownloadMode::Redirect => {
            let url = state
                .store
                .presign_get(&key, state.settings.presign_ttl)
                .await
                .map_err(|e| storage_error(&Method::GET, &key, e))?;
            tracing::debug!(key, "Redirecting to presigned url");
            Redirect::temporary(&url).into_response()
        }
    };

    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// Stream the object body to the client.
///
/// Bytes are counted per chunk as they are handed to the connection, so a
/// copy cut short by a client disconnect is still accounted for.
async fn proxy_object(state: &AppState, key: &str) -> StoreResult<Response> {
    let object = state
        .store
        .get_object(key)
        .await
        .map_err(|e| storage_error(&Method::GET, key, e))?;

    let counter = state.metrics.download_bytes.clone();
    let stream = object.stream.inspect(move |chunk| match chunk {
        Ok(bytes) => counter.inc_by(bytes.len() as u64),
        Err(e) => tracing::warn!("Error reading object body: {e}"),
    });

    let mut response = Response::new(Body::from_stream(stream));
    if let Some(len) = object.content_length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    Ok(response)
}

// ============================================================
// Helpers
// ============================================================

/// Parse the request path and check access to the file it names.
fn authorize(state: &AppState, path: &str, headers: &HeaderMap) -> StoreResult<FileIdentity> {
    let file = FileIdentity::parse(path)?;
    let credentials = auth::basic_credentials(headers);

    if !state.authenticator.authorized(&file, credentials.as_ref()) {
        tracing::info!(
            path,
            has_credentials = credentials.is_some(),
            "Not authorized"
        );
        return Err(StoreError::Unauthorized {
            domain: state.settings.auth_domain.clone(),
        });
    }

    Ok(file)
}

fn content_disposition(file: &FileIdentity) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(&format!("attachment; filename={}", file.filename))
        .map_err(|_| StoreError::BadRequest(format!("invalid filename: {:?}", file.filename)))
}

fn storage_error(method: &Method, key: &str, err: StorageError) -> StoreError {
    if err.is_not_found() {
        tracing::debug!(%method, key, "Not found: {err}");
        return StoreError::NotFound;
    }
    tracing::warn!(%method, key, "Storage error: {err}");
    StoreError::Storage(err.to_string())
}
