//! Borrow/return endpoints and borrower listing

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::Book,
        borrower::{BookLoanRequest, Borrower},
        user::UserClaims,
    },
    AppState,
};

use super::ApiJson;

/// Borrow/return response with the book's new state
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub message: String,
    pub book: Book,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/books/borrow/",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BookLoanRequest,
    responses(
        (status = 200, description = "Book borrowed", body = LoanResponse),
        (status = 400, description = "Book unavailable or borrow limit reached", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(request): ApiJson<BookLoanRequest>,
) -> AppResult<Json<LoanResponse>> {
    let book = state.services.loans.borrow(claims.user_id, request.book_id()?).await?;

    Ok(Json(LoanResponse {
        message: "Book borrowed successfully".to_string(),
        book,
    }))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/books/return/",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BookLoanRequest,
    responses(
        (status = 200, description = "Book returned", body = LoanResponse),
        (status = 400, description = "Book not borrowed by this user", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    ApiJson(request): ApiJson<BookLoanRequest>,
) -> AppResult<Json<LoanResponse>> {
    let book = state
        .services
        .loans
        .return_book(claims.user_id, request.book_id()?)
        .await?;

    Ok(Json(LoanResponse {
        message: "Book returned successfully".to_string(),
        book,
    }))
}

/// Borrowers currently holding books
#[utoipa::path(
    get,
    path = "/borrowers/",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active borrowers", body = Vec<Borrower>),
        (status = 403, description = "Staff privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_borrowers(State(state): State<AppState>) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.loans.list_active_borrowers().await?;
    Ok(Json(borrowers))
}
