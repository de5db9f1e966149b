//! Book endpoints and search

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookInput, BookSearchQuery},
    AppState,
};

use super::{ApiJson, ApiPath, ApiQuery};

/// Book write response
#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub message: String,
    pub data: Book,
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(book): ApiJson<BookInput>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let created = state.services.catalog.create_book(book).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            message: "Book created successfully!".to_string(),
            data: created,
        }),
    ))
}

/// List all books
#[utoipa::path(
    get,
    path = "/books/",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Replace an existing book
#[utoipa::path(
    put,
    path = "/books/{id}/update/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(book): ApiJson<BookInput>,
) -> AppResult<Json<BookResponse>> {
    let updated = state.services.catalog.update_book(id, book).await?;
    Ok(Json(BookResponse {
        message: "Book updated successfully!".to_string(),
        data: updated,
    }))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}/delete/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search books by title, author name and availability
#[utoipa::path(
    get,
    path = "/search-filter/",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    ApiQuery(query): ApiQuery<BookSearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .services
        .catalog
        .search_books(raw.as_deref().unwrap_or(""), &query)
        .await?;
    Ok(Json(books))
}
