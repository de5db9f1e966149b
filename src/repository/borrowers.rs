//! Borrowers repository: borrower profiles and circulation transactions

use std::collections::HashMap;

use sqlx::{FromRow, Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrower::{ensure_can_borrow, Borrower, BorrowerRow, LoanRule},
    },
};

use super::books::BOOK_COLUMNS;

/// A held book tagged with its borrower
#[derive(FromRow)]
struct HeldBookRow {
    borrower_id: i32,
    #[sqlx(flatten)]
    book: Book,
}

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrowers currently holding at least one book
    pub async fn list_active(&self) -> AppResult<Vec<Borrower>> {
        let rows = sqlx::query_as::<_, BorrowerRow>(
            r#"
            SELECT br.id, br.user_id, u.username, br.created_at
            FROM borrowers br
            JOIN users u ON u.id = br.user_id
            WHERE EXISTS (SELECT 1 FROM borrower_books bb WHERE bb.borrower_id = br.id)
            ORDER BY br.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let query = format!(
            r#"
            SELECT bb.borrower_id, {}
            FROM borrower_books bb
            JOIN books b ON b.id = bb.book_id
            JOIN authors a ON a.id = b.author_id
            WHERE bb.borrower_id = ANY($1)
            ORDER BY bb.borrowed_at, b.id
            "#,
            BOOK_COLUMNS
        );
        let held = sqlx::query_as::<_, HeldBookRow>(&query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut books_by_borrower: HashMap<i32, Vec<Book>> = HashMap::new();
        for row in held {
            books_by_borrower.entry(row.borrower_id).or_default().push(row.book);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let books = books_by_borrower.remove(&row.id).unwrap_or_default();
                Borrower::from_row(row, books)
            })
            .collect())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lock the user's borrower row, creating it when missing
    async fn lock_borrower(tx: &mut Transaction<'_, Postgres>, user_id: i32) -> AppResult<i32> {
        sqlx::query("INSERT INTO borrowers (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        let borrower_id: i32 =
            sqlx::query_scalar("SELECT id FROM borrowers WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(borrower_id)
    }

    /// Lock a book row and return its availability
    async fn lock_book(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<bool> {
        sqlx::query_scalar("SELECT available FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Hand a book to the user's borrower profile.
    ///
    /// Runs in one transaction holding row locks on the book and the borrower,
    /// so concurrent requests cannot double-lend a book or exceed the limit.
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let available = Self::lock_book(&mut tx, book_id).await?;
        if !available {
            return Err(LoanRule::BookUnavailable.into());
        }

        let borrower_id = Self::lock_borrower(&mut tx, user_id).await?;
        let held: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrower_books WHERE borrower_id = $1")
            .bind(borrower_id)
            .fetch_one(&mut *tx)
            .await?;
        ensure_can_borrow(available, held)?;

        sqlx::query("INSERT INTO borrower_books (borrower_id, book_id) VALUES ($1, $2)")
            .bind(borrower_id)
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE books SET available = FALSE, last_borrowed_date = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Take a book back from the user's borrower profile
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        Self::lock_book(&mut tx, book_id).await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM borrower_books bb
            USING borrowers br
            WHERE bb.borrower_id = br.id AND br.user_id = $1 AND bb.book_id = $2
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            return Err(LoanRule::NotBorrowed.into());
        }

        sqlx::query("UPDATE books SET available = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
