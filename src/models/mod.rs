//! Data models for Libris

pub mod author;
pub mod book;
pub mod borrower;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use borrower::Borrower;
pub use user::{User, UserClaims};
