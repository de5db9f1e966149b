//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::book::{like_pattern, Book, BookFilter, BookInput},
};

/// Columns of `Book`, with `b` aliasing books and `a` aliasing authors
pub(crate) const BOOK_COLUMNS: &str = r#"
    b.id, b.title, b.author_id, a.name AS author_name, b.isbn, b.published_date,
    b.available, b.last_borrowed_date, b.created_at, b.updated_at
"#;

fn author_field_error(author_id: i32) -> AppError {
    AppError::InvalidFields(FieldErrors::single(
        "author",
        format!("Invalid pk \"{}\" - object does not exist.", author_id),
    ))
}

/// Map a foreign key violation on author_id to a field error
fn map_write_error(err: sqlx::Error, author_id: i32) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => author_field_error(author_id),
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let query = format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id WHERE b.id = $1",
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.search(&BookFilter::default()).await
    }

    /// Books matching every filter that is set
    pub async fn search(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id WHERE 1=1",
            BOOK_COLUMNS
        ));

        if let Some(ref title) = filter.title {
            builder
                .push(" AND b.title ILIKE ")
                .push_bind(like_pattern(title))
                .push(" ESCAPE '\\'");
        }

        if let Some(ref author) = filter.author {
            builder
                .push(" AND a.name ILIKE ")
                .push_bind(like_pattern(author))
                .push(" ESCAPE '\\'");
        }

        if let Some(available) = filter.available {
            builder.push(" AND b.available = ").push_bind(available);
        }

        builder.push(" ORDER BY b.id");

        let books = builder.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    pub async fn create(&self, book: &BookInput) -> AppResult<Book> {
        let query = format!(
            r#"
            WITH b AS (
                INSERT INTO books (title, author_id, isbn, published_date)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(book.author)
            .bind(&book.isbn)
            .bind(book.published_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, book.author))
    }

    pub async fn update(&self, id: i32, book: &BookInput) -> AppResult<Book> {
        let query = format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = $1, author_id = $2, isbn = $3, published_date = $4, updated_at = NOW()
                WHERE id = $5
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(book.author)
            .bind(&book.isbn)
            .bind(book.published_date)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, book.author))?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }
        Ok(())
    }

    /// Count all books and available books
    pub async fn count(&self) -> AppResult<(i64, i64)> {
        let (total, available): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE available) FROM books",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((total, available))
    }
}
