//! Author endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::author::{Author, AuthorInput},
    AppState,
};

use super::{ApiJson, ApiPath};

/// Author write response
#[derive(Serialize, ToSchema)]
pub struct AuthorResponse {
    pub message: String,
    pub data: Author,
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/authors/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorInput,
    responses(
        (status = 201, description = "Author created", body = AuthorResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    ApiJson(author): ApiJson<AuthorInput>,
) -> AppResult<(StatusCode, Json<AuthorResponse>)> {
    let created = state.services.catalog.create_author(author).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthorResponse {
            message: "Author created successfully!".to_string(),
            data: created,
        }),
    ))
}

/// List all authors
#[utoipa::path(
    get,
    path = "/authors/",
    tag = "authors",
    responses(
        (status = 200, description = "List of authors", body = Vec<Author>)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.catalog.list_authors().await?;
    Ok(Json(authors))
}

/// Get author details by ID
#[utoipa::path(
    get,
    path = "/authors/{id}/",
    tag = "authors",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> AppResult<Json<Author>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Replace an existing author
#[utoipa::path(
    put,
    path = "/authors/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    request_body = AuthorInput,
    responses(
        (status = 200, description = "Author updated", body = AuthorResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(author): ApiJson<AuthorInput>,
) -> AppResult<Json<AuthorResponse>> {
    let updated = state.services.catalog.update_author(id, author).await?;
    Ok(Json(AuthorResponse {
        message: "Author updated successfully!".to_string(),
        data: updated,
    }))
}

/// Delete an author and their books
#[utoipa::path(
    delete,
    path = "/authors/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(State(state): State<AppState>, ApiPath(id): ApiPath<i32>) -> AppResult<StatusCode> {
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
