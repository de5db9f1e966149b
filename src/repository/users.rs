//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{RegisterUser, UpdateRoles, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Get user by username (authentication)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a user together with its borrower profile
    pub async fn create(
        &self,
        user: &RegisterUser,
        password_hash: &str,
        is_staff: bool,
        is_superuser: bool,
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(password_hash)
        .bind(is_staff)
        .bind(is_superuser)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO borrowers (user_id) VALUES ($1)")
            .bind(created.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn update_roles(&self, id: i32, roles: &UpdateRoles) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_staff = $1, is_superuser = $2 WHERE id = $3 RETURNING *",
        )
        .bind(roles.is_staff)
        .bind(roles.is_superuser)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
