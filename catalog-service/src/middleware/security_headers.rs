//! Hardening response headers
//!
//! Applied with `if_not_present` so a handler can still override any of them.

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::MiddlewareConfig;

/// Referrer policy sent with every response
pub const REFERRER_POLICY: &str = "strict-origin-when-cross-origin";

/// Add the security header layers when enabled in configuration
pub fn apply_security_headers(mut app: Router, config: &MiddlewareConfig) -> Router {
    if !config.security_headers {
        return app;
    }

    app = app
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        // Disable the legacy browser XSS filter
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static(REFERRER_POLICY),
        ));

    app
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    fn router() -> Router {
        Router::new().route("/", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_headers_added_when_enabled() {
        let app = apply_security_headers(router(), &MiddlewareConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::X_XSS_PROTECTION], "0");
        assert_eq!(headers[header::REFERRER_POLICY], REFERRER_POLICY);
    }

    #[tokio::test]
    async fn test_headers_skipped_when_disabled() {
        let config = MiddlewareConfig {
            security_headers: false,
            ..MiddlewareConfig::default()
        };
        let app = apply_security_headers(router(), &config);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().get(header::X_FRAME_OPTIONS).is_none());
    }
}
