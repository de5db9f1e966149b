//! Statistics service

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, repository::Repository};

use super::cache::{self, ResponseCache};

/// Library-wide counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LibraryStatistics {
    pub total_books: i64,
    pub available_books: i64,
    pub borrowed_books: i64,
    pub total_authors: i64,
    pub total_borrowers: i64,
}

impl LibraryStatistics {
    pub fn new(total_books: i64, available_books: i64, total_authors: i64, total_borrowers: i64) -> Self {
        Self {
            total_books,
            available_books,
            borrowed_books: total_books - available_books,
            total_authors,
            total_borrowers,
        }
    }
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    cache: ResponseCache,
}

impl StatsService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    pub async fn get_statistics(&self) -> AppResult<LibraryStatistics> {
        self.cache
            .get_or_load(cache::STATISTICS, || self.compute())
            .await
    }

    async fn compute(&self) -> AppResult<LibraryStatistics> {
        let (total_books, available_books) = self.repository.books.count().await?;
        let total_authors = self.repository.authors.count().await?;
        let total_borrowers = self.repository.borrowers.count().await?;
        Ok(LibraryStatistics::new(
            total_books,
            available_books,
            total_authors,
            total_borrowers,
        ))
    }
}
