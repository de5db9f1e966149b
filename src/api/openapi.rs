//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health, loans, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libris API",
        version = "1.0.0",
        description = "Library Management System REST API"
    ),
    servers(
        (url = "/api", description = "Libris API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::refresh,
        auth::me,
        // Authors
        authors::create_author,
        authors::list_authors,
        authors::get_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::create_book,
        books::list_books,
        books::get_book,
        books::update_book,
        books::delete_book,
        books::search_books,
        // Loans
        loans::borrow_book,
        loans::return_book,
        loans::list_borrowers,
        // Stats
        stats::get_statistics,
        // Users
        users::update_roles,
    ),
    components(
        schemas(
            // Auth
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RefreshRequest,
            auth::RefreshResponse,
            crate::services::auth::TokenPair,
            // Users
            crate::models::user::User,
            crate::models::user::RegisterUser,
            crate::models::user::UpdateRoles,
            users::UserResponse,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorInput,
            authors::AuthorResponse,
            // Books
            crate::models::book::Book,
            crate::models::book::BookInput,
            books::BookResponse,
            // Loans
            crate::models::borrower::Borrower,
            crate::models::borrower::BorrowerUser,
            crate::models::borrower::BookLoanRequest,
            loans::LoanResponse,
            // Stats
            crate::services::stats::LibraryStatistics,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book management and search"),
        (name = "loans", description = "Borrowing and returning books"),
        (name = "stats", description = "Statistics"),
        (name = "users", description = "User administration")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
