//! Borrow/return service

use crate::{
    error::AppResult,
    models::{book::Book, borrower::Borrower},
    repository::Repository,
};

use super::cache::{self, CacheScope, ResponseCache};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    cache: ResponseCache,
}

impl LoansService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    /// Borrow a book for the given user and return its new state
    pub async fn borrow(&self, user_id: i32, book_id: i32) -> AppResult<Book> {
        self.repository.borrowers.borrow(user_id, book_id).await?;
        tracing::info!(user_id, book_id, "book borrowed");
        self.cache.invalidate(CacheScope::Books).await;
        self.repository.books.get_by_id(book_id).await
    }

    /// Return a book held by the given user and return its new state
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<Book> {
        self.repository.borrowers.return_book(user_id, book_id).await?;
        tracing::info!(user_id, book_id, "book returned");
        self.cache.invalidate(CacheScope::Books).await;
        self.repository.books.get_by_id(book_id).await
    }

    /// Borrowers currently holding books
    pub async fn list_active_borrowers(&self) -> AppResult<Vec<Borrower>> {
        let repository = &self.repository;
        self.cache
            .get_or_load(cache::BORROWER_LIST, || repository.borrowers.list_active())
            .await
    }
}
