//! Generated API document served by the router
#![cfg(feature = "openapi")]

mod common;

use axum::http::StatusCode;
use common::{get, test_app};

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app();

    let (status, doc) = get(&app, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert!(doc["paths"]["/books"]["get"].is_object());
    assert!(doc["paths"]["/categories/{id}"]["put"].is_object());
    assert_eq!(
        doc["components"]["securitySchemes"]["bearerAuth"]["scheme"],
        "bearer"
    );
    assert!(doc["components"]["schemas"]["PageMeta"].is_object());
}

