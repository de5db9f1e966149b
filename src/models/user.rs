//! User model, JWT claims and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 3, max = 150, message = "Username must be between 3 and 150 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Role flags update (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoles {
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Kind of JWT issued at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub token_type: TokenType,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Build claims for `user` valid for `lifetime` from now
    pub fn for_user(user: &User, token_type: TokenType, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Parse a token and require it to be of the given type
    pub fn from_token_of_type(token: &str, secret: &str, expected: TokenType) -> Result<Self, AppError> {
        let claims = Self::from_token(token, secret).map_err(|e| AppError::Authentication(e.to_string()))?;
        if claims.token_type != expected {
            return Err(AppError::Authentication("Token has wrong type".to_string()));
        }
        Ok(claims)
    }

    // Authorization checks. Flags are independent: superuser does not imply staff.
    pub fn is_admin(&self) -> bool {
        self.is_superuser
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You do not have permission to perform this action.".to_string(),
            ))
        }
    }
}
