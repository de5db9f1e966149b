//! Borrower model and circulation rules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;

use super::book::Book;
use crate::error::AppError;

/// Maximum number of books a borrower may hold at the same time
pub const MAX_BORROWED_BOOKS: i64 = 3;

/// Circulation rules that can reject a borrow or return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoanRule {
    #[error("This book is not available for borrowing")]
    BookUnavailable,

    #[error("You cannot borrow more than {limit} books at a time")]
    BorrowLimitReached { limit: i64 },

    #[error("You have not borrowed this book")]
    NotBorrowed,
}

/// Check that a book can be handed to a borrower currently holding `held` books.
pub fn ensure_can_borrow(book_available: bool, held: i64) -> Result<(), LoanRule> {
    if !book_available {
        return Err(LoanRule::BookUnavailable);
    }
    if held >= MAX_BORROWED_BOOKS {
        return Err(LoanRule::BorrowLimitReached {
            limit: MAX_BORROWED_BOOKS,
        });
    }
    Ok(())
}

/// Borrower row from database
#[derive(Debug, Clone, FromRow)]
pub struct BorrowerRow {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Owner of a borrower profile
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowerUser {
    pub id: i32,
    pub username: String,
}

/// Borrower with the books currently held
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Borrower {
    pub id: i32,
    pub user: BorrowerUser,
    pub books_borrowed: Vec<Book>,
    pub created_at: DateTime<Utc>,
}

impl Borrower {
    pub fn from_row(row: BorrowerRow, books_borrowed: Vec<Book>) -> Self {
        Self {
            id: row.id,
            user: BorrowerUser {
                id: row.user_id,
                username: row.username,
            },
            books_borrowed,
            created_at: row.created_at,
        }
    }
}

/// Borrow/return request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookLoanRequest {
    #[serde(default)]
    pub book_id: Option<i32>,
}

impl BookLoanRequest {
    /// The requested book; a missing id names no book
    pub fn book_id(&self) -> Result<i32, AppError> {
        self.book_id
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }
}
