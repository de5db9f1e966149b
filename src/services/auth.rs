//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Duration;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult, FieldErrors},
    models::user::{RegisterUser, TokenType, UpdateRoles, User, UserClaims},
    repository::Repository,
};

use super::cache::{CacheScope, ResponseCache};

/// Access and refresh tokens issued at login
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    cache: ResponseCache,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, cache: ResponseCache) -> Self {
        Self {
            repository,
            config,
            cache,
        }
    }

    /// Register a new user with a borrower profile
    pub async fn register(&self, user: RegisterUser) -> AppResult<User> {
        user.validate()?;

        if self.repository.users.username_exists(&user.username).await? {
            return Err(AppError::InvalidFields(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }

        let hash = self.hash_password(&user.password)?;
        let created = self.repository.users.create(&user, &hash, false, false).await?;
        tracing::info!(user_id = created.id, username = %created.username, "user registered");

        self.cache.invalidate(CacheScope::Members).await;
        Ok(created)
    }

    /// Authenticate by username and password, returning the user and a token pair
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(User, TokenPair)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Authentication("User account is disabled".to_string()));
        }

        let tokens = TokenPair {
            access: self.issue(&user, TokenType::Access)?,
            refresh: self.issue(&user, TokenType::Refresh)?,
        };
        tracing::info!(user_id = user.id, "user logged in");
        Ok((user, tokens))
    }

    /// Exchange a refresh token for a new access token.
    /// The user is re-read so role changes apply to the new token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims =
            UserClaims::from_token_of_type(refresh_token, &self.config.jwt_secret, TokenType::Refresh)?;

        let user = match self.repository.users.get_by_id(claims.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("User no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AppError::Authentication("User account is disabled".to_string()));
        }

        self.issue(&user, TokenType::Access)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Grant or revoke staff and superuser flags
    pub async fn update_roles(&self, id: i32, roles: UpdateRoles) -> AppResult<User> {
        let user = self.repository.users.update_roles(id, &roles).await?;
        tracing::info!(
            user_id = id,
            is_staff = roles.is_staff,
            is_superuser = roles.is_superuser,
            "user roles updated"
        );
        Ok(user)
    }

    /// Create a superuser (staff and superuser flags) unless the username is taken
    pub async fn ensure_superuser(&self, username: &str, password: &str) -> AppResult<()> {
        if self.repository.users.username_exists(username).await? {
            return Ok(());
        }

        let admin = RegisterUser {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
        };
        admin.validate()?;

        let hash = self.hash_password(password)?;
        let created = self.repository.users.create(&admin, &hash, true, true).await?;
        tracing::info!(user_id = created.id, username, "bootstrap superuser created");
        Ok(())
    }

    fn issue(&self, user: &User, token_type: TokenType) -> AppResult<String> {
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(self.config.access_token_minutes),
            TokenType::Refresh => Duration::days(self.config.refresh_token_days),
        };
        UserClaims::for_user(user, token_type, lifetime)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
