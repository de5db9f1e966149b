//! Authors repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, AuthorInput},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Author not found".to_string()))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    pub async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, bio, birth_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.birth_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET name = $1, bio = $2, birth_date = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&author.name)
        .bind(&author.bio)
        .bind(author.birth_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Author not found".to_string()))
    }

    /// Delete an author (its books go with it)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Author not found".to_string()));
        }
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
