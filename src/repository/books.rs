//! Books repository

use async_trait::async_trait;
use sqlx::{postgres::PgRow, FromRow, Pool, Postgres, Row};

use super::{bind_filter_params, filter::Filter, translate_constraint, BookStore, Constraint};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, CreateBook, Pagination},
};

/// Projection of a book joined with its author. Expects the book rows to be
/// reachable as `b`.
const BOOK_WITH_AUTHOR_COLUMNS: &str = r#"
    b.id, b.title, b.isbn, b.published_date, b.genre, b.author_id,
    b.created_at, b.updated_at,
    a.first_name AS author_first_name, a.last_name AS author_last_name,
    a.bio AS author_bio, a.birth_date AS author_birth_date,
    a.created_at AS author_created_at, a.updated_at AS author_updated_at
"#;

fn book_with_author(row: &PgRow) -> Result<Book, sqlx::Error> {
    let mut book = Book::from_row(row)?;
    book.author = Some(Author {
        id: book.author_id,
        first_name: row.try_get("author_first_name")?,
        last_name: row.try_get("author_last_name")?,
        bio: row.try_get("author_bio")?,
        birth_date: row.try_get("author_birth_date")?,
        created_at: row.try_get("author_created_at")?,
        updated_at: row.try_get("author_updated_at")?,
        books: None,
    });
    Ok(book)
}

/// Translate the books table constraints into domain errors
fn book_write_error(err: sqlx::Error) -> AppError {
    translate_constraint(err, |constraint| {
        Some(match constraint {
            Constraint::Unique => AppError::Conflict("ISBN already exists".to_string()),
            Constraint::ForeignKey => AppError::InvalidReference("Author does not exist".to_string()),
        })
    })
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let query = format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id WHERE b.id = $1",
            BOOK_WITH_AUTHOR_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(book_with_author).transpose()?)
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Book>, i64)> {
        let (conditions, params) = filter.to_sql("b.", 1);
        let limit_idx = params.len() + 1;

        let count_query = format!("SELECT COUNT(*) FROM books b WHERE {}", conditions);
        let total: i64 = bind_filter_params!(sqlx::query_scalar::<_, i64>(&count_query), params)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            r#"
            SELECT {}
            FROM books b
            JOIN authors a ON a.id = b.author_id
            WHERE {}
            ORDER BY b.id
            LIMIT ${} OFFSET ${}
            "#,
            BOOK_WITH_AUTHOR_COLUMNS,
            conditions,
            limit_idx,
            limit_idx + 1
        );
        let rows = bind_filter_params!(sqlx::query(&select_query), params)
            .bind(pagination.take())
            .bind(pagination.skip())
            .fetch_all(&self.pool)
            .await?;

        let books = rows
            .iter()
            .map(book_with_author)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Book search returned {} of {} rows", books.len(), total);
        Ok((books, total))
    }

    async fn insert(&self, data: &CreateBook) -> AppResult<Book> {
        let query = format!(
            r#"
            WITH b AS (
                INSERT INTO books (title, isbn, published_date, genre, author_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_WITH_AUTHOR_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&data.title)
            .bind(&data.isbn)
            .bind(data.published_date)
            .bind(&data.genre)
            .bind(data.author_id)
            .fetch_one(&self.pool)
            .await
            .map_err(book_write_error)?;
        Ok(book_with_author(&row)?)
    }

    async fn save(&self, book: &Book) -> AppResult<Book> {
        let query = format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = $1, isbn = $2, published_date = $3, genre = $4,
                    author_id = $5, updated_at = NOW()
                WHERE id = $6
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_WITH_AUTHOR_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(&book.title)
            .bind(&book.isbn)
            .bind(book.published_date)
            .bind(&book.genre)
            .bind(book.author_id)
            .bind(book.id)
            .fetch_one(&self.pool)
            .await
            .map_err(book_write_error)?;
        Ok(book_with_author(&row)?)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
