//! Catalog management service (authors and books)

use validator::Validate;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{
        author::{Author, AuthorInput},
        book::{Book, BookFilter, BookInput, BookSearchQuery},
    },
    repository::Repository,
};

use super::cache::{self, CacheScope, ResponseCache};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    cache: ResponseCache,
}

impl CatalogService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        let repository = &self.repository;
        self.cache
            .get_or_load(cache::AUTHOR_LIST, || repository.authors.list())
            .await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: AuthorInput) -> AppResult<Author> {
        author.validate()?;
        let created = self.repository.authors.create(&author).await?;
        tracing::info!(author_id = created.id, "author created");
        self.cache.invalidate(CacheScope::Authors).await;
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, author: AuthorInput) -> AppResult<Author> {
        author.validate()?;
        let updated = self.repository.authors.update(id, &author).await?;
        tracing::info!(author_id = id, "author updated");
        self.cache.invalidate(CacheScope::Authors).await;
        Ok(updated)
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "author deleted");
        self.cache.invalidate(CacheScope::Authors).await;
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        let repository = &self.repository;
        self.cache
            .get_or_load(cache::BOOK_LIST, || repository.books.list())
            .await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Search books; results are cached per raw query string
    pub async fn search_books(&self, raw_query: &str, query: &BookSearchQuery) -> AppResult<Vec<Book>> {
        let filter = BookFilter::from(query);
        let repository = &self.repository;
        self.cache
            .get_or_load(&cache::search_key(raw_query), || async move {
                repository.books.search(&filter).await
            })
            .await
    }

    pub async fn create_book(&self, book: BookInput) -> AppResult<Book> {
        self.validate_book(&book).await?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, author_id = created.author, "book created");
        self.cache.invalidate(CacheScope::Books).await;
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, book: BookInput) -> AppResult<Book> {
        // Unknown book wins over invalid input
        self.repository.books.get_by_id(id).await?;
        self.validate_book(&book).await?;
        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!(book_id = id, "book updated");
        self.cache.invalidate(CacheScope::Books).await;
        Ok(updated)
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "book deleted");
        self.cache.invalidate(CacheScope::Books).await;
        Ok(())
    }

    async fn validate_book(&self, book: &BookInput) -> AppResult<()> {
        let mut fields = match book.validate() {
            Ok(()) => FieldErrors::default(),
            Err(errors) => FieldErrors::from(errors),
        };

        if !self.repository.authors.exists(book.author).await? {
            fields.0.insert(
                "author".to_string(),
                vec![format!("Invalid pk \"{}\" - object does not exist.", book.author)],
            );
        }

        if fields.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(fields))
        }
    }
}
