//! HTTP Basic credentials.

use axum::http::HeaderMap;
use axum_extra::headers::authorization::{Authorization, Basic};
use axum_extra::headers::HeaderMapExt;
use nodestore_policy::Credential;

/// Credentials from an `Authorization: Basic ...` header.
///
/// A missing header, another scheme, or an undecodable value all count as no
/// credentials.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Credential> {
    let Authorization(basic) = headers.typed_get::<Authorization<Basic>>()?;
    Some(Credential::new(basic.username(), basic.password()))
}
