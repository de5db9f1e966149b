//! API handlers for Libris REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod permissions;
pub mod stats;
pub mod users;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::{header::AUTHORIZATION, request::Parts},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::user::{TokenType, UserClaims},
    AppState,
};

use permissions::{require, Admin, Authenticated, Staff};

/// Extractor for authenticated user from JWT access token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token_of_type(token, &state.config.auth.jwt_secret, TokenType::Access)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body extractor reporting malformed payloads as validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Path extractor reporting unparsable segments as validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Query string extractor reporting bad parameters as validation errors
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let open = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/token/refresh/", post(auth::refresh))
        // Catalog (read)
        .route("/authors/", get(authors::list_authors))
        .route("/authors/:id/", get(authors::get_author))
        .route("/books/", get(books::list_books))
        .route("/books/:id/", get(books::get_book))
        .route("/search-filter/", get(books::search_books));

    let member = Router::new()
        .route("/auth/me/", get(auth::me))
        .route("/books/borrow/", post(loans::borrow_book))
        .route("/books/return/", post(loans::return_book))
        .route_layer(middleware::from_fn_with_state(state.clone(), require::<Authenticated>));

    let staff = Router::new()
        .route("/authors/create/", post(authors::create_author))
        .route("/authors/:id/update/", put(authors::update_author))
        .route("/authors/:id/delete/", delete(authors::delete_author))
        .route("/books/create/", post(books::create_book))
        .route("/books/:id/update/", put(books::update_book))
        .route("/books/:id/delete/", delete(books::delete_book))
        .route("/library/statistics/", get(stats::get_statistics))
        .route("/borrowers/", get(loans::list_borrowers))
        .route_layer(middleware::from_fn_with_state(state.clone(), require::<Staff>));

    let admin = Router::new()
        .route("/users/:id/roles/", put(users::update_roles))
        .route_layer(middleware::from_fn_with_state(state.clone(), require::<Admin>));

    let api = Router::new()
        .merge(open)
        .merge(member)
        .merge(staff)
        .merge(admin)
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
