//! Data models for Bookshelf

pub mod author;
pub mod book;
pub mod pagination;

// Re-export commonly used types
pub use author::{Author, AuthorQuery, CreateAuthor, UpdateAuthor};
pub use book::{Book, BookQuery, CreateBook, UpdateBook};
pub use pagination::{Paginated, Pagination};
