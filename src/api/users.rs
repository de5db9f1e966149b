//! User administration endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{UpdateRoles, User},
    AppState,
};

use super::{ApiJson, ApiPath};

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub message: String,
    pub data: User,
}

/// Update a user's staff and superuser flags (admin only)
#[utoipa::path(
    put,
    path = "/users/{id}/roles/",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateRoles,
    responses(
        (status = 200, description = "Roles updated", body = UserResponse),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_roles(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(roles): ApiJson<UpdateRoles>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.auth.update_roles(id, roles).await?;
    Ok(Json(UserResponse {
        message: "User roles updated successfully!".to_string(),
        data: user,
    }))
}
