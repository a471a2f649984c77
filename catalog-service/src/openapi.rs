//! OpenAPI document and Swagger UI
//!
//! Enabled by the `openapi` feature. [`routes`] serves the interactive UI at
//! `/api-docs` and the raw document at `/api-docs/openapi.json`.

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{IntoParams, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ErrorResponse;
use crate::handlers::{
    self, health::HealthResponse, ItemResponse, ListResponse, MessageResponse, TokenResponse,
};
use crate::models::{
    Author, AuthorDraft, AuthorRef, Book, BookDraft, BookStats, BookSummary, Category,
    CategoryCount, CategoryDraft, CategoryRef, Credentials, Publisher, PublisherCount,
    PublisherDraft, PublisherRef,
};
use crate::query::PageMeta;

/// Path of the Swagger UI
pub const UI_PATH: &str = "/api-docs";

/// Path of the JSON document
pub const DOC_PATH: &str = "/api-docs/openapi.json";

/// Name of the bearer token security scheme
pub const BEARER_AUTH: &str = "bearerAuth";

/// Paging, ordering and search parameters shared by every list endpoint
///
/// Invalid values never fail the request; they fall back to defaults.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQueryParams {
    /// 1-based page number, default 1
    pub page: Option<u64>,
    /// Page size, default 10, clamped to the configured maximum
    pub limit: Option<u64>,
    /// Sort field, prefixed with `-` for descending order
    pub sort: Option<String>,
    /// Free-text term matched against the resource's searchable fields
    pub search: Option<String>,
}

/// Registers the HTTP bearer scheme the protected operations refer to
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Catalog API",
        description = "Books, authors, categories and publishers with paged, sortable and searchable listings"
    ),
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::books::list,
        handlers::books::stats,
        handlers::books::get,
        handlers::books::create,
        handlers::books::update,
        handlers::books::delete,
        handlers::authors::list,
        handlers::authors::get,
        handlers::authors::create,
        handlers::authors::update,
        handlers::authors::delete,
        handlers::categories::list,
        handlers::categories::get,
        handlers::categories::create,
        handlers::categories::update,
        handlers::categories::delete,
        handlers::publishers::list,
        handlers::publishers::get,
        handlers::publishers::create,
        handlers::publishers::update,
        handlers::publishers::delete,
    ),
    components(schemas(
        Book,
        BookDraft,
        BookSummary,
        BookStats,
        CategoryCount,
        PublisherCount,
        Author,
        AuthorDraft,
        AuthorRef,
        Category,
        CategoryDraft,
        CategoryRef,
        Publisher,
        PublisherDraft,
        PublisherRef,
        Credentials,
        TokenResponse,
        HealthResponse,
        ErrorResponse,
        PageMeta,
        ListResponse<Book>,
        ItemResponse<Book>,
        MessageResponse<Book>,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration and token issuance"),
        (name = "books", description = "Books; reads are public"),
        (name = "authors", description = "Authors"),
        (name = "categories", description = "Categories"),
        (name = "publishers", description = "Publishers"),
    )
)]
pub struct ApiDoc;

/// The generated document, with the crate version filled in
pub fn document() -> utoipa::openapi::OpenApi {
    let mut openapi = ApiDoc::openapi();
    openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
    openapi
}

/// Swagger UI plus the JSON document, ready to merge into the app router
pub fn routes() -> Router {
    SwaggerUi::new(UI_PATH).url(DOC_PATH, document()).into()
}
