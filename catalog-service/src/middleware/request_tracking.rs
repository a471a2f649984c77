//! Request ID generation and sensitive header masking
//!
//! Every response carries an `x-request-id`, either the one the client sent
//! or a fresh UUID. Credentials are marked sensitive before the trace layer
//! sees them so they never reach the logs.

use axum::http::header::{self, HeaderName};
use once_cell::sync::Lazy;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

/// Request headers masked in trace output
pub static SENSITIVE_HEADERS: Lazy<Vec<HeaderName>> = Lazy::new(|| {
    vec![
        header::AUTHORIZATION,
        header::COOKIE,
        header::SET_COOKIE,
        HeaderName::from_static("x-api-key"),
        HeaderName::from_static("x-auth-token"),
    ]
});

/// Assign a UUID request ID when the client did not send one
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Copy the request ID onto the response
pub fn request_id_propagation_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

pub fn sensitive_headers_layer() -> SetSensitiveRequestHeadersLayer {
    SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS.iter().cloned())
}
