//! Repository layer for database operations.
//!
//! The services only see the [`AuthorStore`] and [`BookStore`] traits; the
//! PostgreSQL implementations live in [`authors`] and [`books`].

pub mod authors;
pub mod books;
pub mod filter;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, CreateAuthor, CreateBook, Pagination},
};
use filter::Filter;

/// Persistence operations on authors
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Point lookup without relations
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Author>>;

    /// Point lookup with the author's books loaded
    async fn find_with_books(&self, id: i32) -> AppResult<Option<Author>>;

    /// Exact match on the (first name, last name) pair
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>>;

    /// One page of matching authors plus the total number of matches
    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Author>, i64)>;

    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author>;

    /// Persist every field of an existing author and refresh `updated_at`
    async fn save(&self, author: &Author) -> AppResult<Author>;

    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Persistence operations on books; every returned book except
/// `find_by_isbn` carries its author
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>>;

    /// Exact ISBN lookup without relations
    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Book>, i64)>;

    async fn insert(&self, data: &CreateBook) -> AppResult<Book>;

    /// Persist every field of an existing book (including `author_id`) and
    /// refresh `updated_at`
    async fn save(&self, book: &Book) -> AppResult<Book>;

    async fn delete(&self, id: i32) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Constraint families the stores translate into domain errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

/// Map a constraint violation through `translate`; any other error (or an
/// untranslated violation) becomes [`AppError::Database`]
pub(crate) fn translate_constraint(
    err: sqlx::Error,
    translate: impl FnOnce(Constraint) -> Option<AppError>,
) -> AppError {
    if let sqlx::Error::Database(ref db) = err {
        let constraint = if db.is_unique_violation() {
            Some(Constraint::Unique)
        } else if db.is_foreign_key_violation() {
            Some(Constraint::ForeignKey)
        } else {
            None
        };
        if let Some(mapped) = constraint.and_then(translate) {
            return mapped;
        }
    }
    AppError::Database(err)
}

/// Bind the parameters produced by [`Filter::to_sql`] onto a query builder
macro_rules! bind_filter_params {
    ($builder:expr, $params:expr) => {{
        let mut builder = $builder;
        for param in $params.iter() {
            builder = match param {
                $crate::repository::filter::SqlParam::Text(value) => builder.bind(value.as_str()),
                $crate::repository::filter::SqlParam::Int(value) => builder.bind(*value),
            };
        }
        builder
    }};
}
pub(crate) use bind_filter_params;
