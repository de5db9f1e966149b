//! Book model, search filters and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book with its author's name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    /// Author ID
    #[sqlx(rename = "author_id")]
    pub author: i32,
    pub author_name: String,
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub available: bool,
    pub last_borrowed_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or replace book request.
///
/// Availability is not writable here: it only changes through borrow/return.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    /// Author ID
    pub author: i32,
    #[validate(length(min = 10, max = 17, message = "ISBN must be between 10 and 17 characters"))]
    pub isbn: Option<String>,
    pub published_date: Option<NaiveDate>,
}

/// Search query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookSearchQuery {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author's name
    pub author: Option<String>,
    /// "true" for available books, any other value for borrowed ones
    pub available: Option<String>,
}

/// Normalized search filter; `None` fields do not constrain the result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub available: Option<bool>,
}

impl From<&BookSearchQuery> for BookFilter {
    fn from(query: &BookSearchQuery) -> Self {
        fn non_empty(value: &Option<String>) -> Option<String> {
            value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
        }

        Self {
            title: non_empty(&query.title),
            author: non_empty(&query.author),
            available: non_empty(&query.available).map(|v| v.eq_ignore_ascii_case("true")),
        }
    }
}

/// Escape LIKE wildcards so user input matches literally (escape char is `\`).
pub fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
