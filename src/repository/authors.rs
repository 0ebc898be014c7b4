//! Authors repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{bind_filter_params, filter::Filter, translate_constraint, AuthorStore, Constraint};
use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, CreateAuthor, Pagination},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Books referencing an author, oldest first
    async fn books_of(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author_id = $1 ORDER BY id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }
}

#[async_trait]
impl AuthorStore for AuthorsRepository {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    async fn find_with_books(&self, id: i32) -> AppResult<Option<Author>> {
        let Some(mut author) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        author.books = Some(self.books_of(id).await?);
        Ok(Some(author))
    }

    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT * FROM authors WHERE first_name = $1 AND last_name = $2 ORDER BY id LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Author>, i64)> {
        let (conditions, params) = filter.to_sql("", 1);
        let limit_idx = params.len() + 1;

        let count_query = format!("SELECT COUNT(*) FROM authors WHERE {}", conditions);
        let total: i64 = bind_filter_params!(sqlx::query_scalar::<_, i64>(&count_query), params)
            .fetch_one(&self.pool)
            .await?;

        let select_query = format!(
            "SELECT * FROM authors WHERE {} ORDER BY id LIMIT ${} OFFSET ${}",
            conditions,
            limit_idx,
            limit_idx + 1
        );
        let authors = bind_filter_params!(sqlx::query_as::<_, Author>(&select_query), params)
            .bind(pagination.take())
            .bind(pagination.skip())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Author search returned {} of {} rows", authors.len(), total);
        Ok((authors, total))
    }

    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, bio, birth_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.bio)
        .bind(data.birth_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    async fn save(&self, author: &Author) -> AppResult<Author> {
        let saved = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $1, last_name = $2, bio = $3, birth_date = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(&author.bio)
        .bind(author.birth_date)
        .bind(author.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                translate_constraint(e, |constraint| match constraint {
                    // A book was attached after the service's guard ran
                    Constraint::ForeignKey => Some(AppError::Conflict(
                        "Cannot delete author with associated books".to_string(),
                    )),
                    Constraint::Unique => None,
                })
            })?;
        Ok(())
    }
}
