//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{RegisterUser, User, UserClaims},
    services::auth::TokenPair,
    AppState,
};

use super::ApiJson;

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub user_data: User,
    pub token: TokenPair,
}

#[derive(Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Serialize, ToSchema)]
pub struct RefreshResponse {
    pub access: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register/",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUser>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.services.auth.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "User registered successfully!".to_string(),
        }),
    ))
}

/// Log in and obtain an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (user, token) = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user_data: user,
        token,
    }))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = RefreshResponse),
        (status = 401, description = "Invalid refresh token", body = crate::error::ErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let access = state.services.auth.refresh(&request.refresh).await?;
    Ok(Json(RefreshResponse { access }))
}

/// Current user
#[utoipa::path(
    get,
    path = "/auth/me/",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = User),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
) -> AppResult<Json<User>> {
    let user = state.services.auth.get_by_id(claims.user_id).await?;
    Ok(Json(user))
}
