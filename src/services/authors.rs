//! Authors service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorQuery, CreateAuthor, Paginated, Pagination, UpdateAuthor},
    repository::{filter::Filter, AuthorStore},
};

/// Columns matched by the `search` parameter
const SEARCH_COLUMNS: &[&str] = &["first_name", "last_name"];

#[derive(Clone)]
pub struct AuthorsService {
    authors: Arc<dyn AuthorStore>,
}

impl AuthorsService {
    pub fn new(authors: Arc<dyn AuthorStore>) -> Self {
        Self { authors }
    }

    /// Create an author; the (first name, last name) pair must be new
    pub async fn create(&self, data: &CreateAuthor) -> AppResult<Author> {
        if self
            .authors
            .find_by_name(&data.first_name, &data.last_name)
            .await?
            .is_some()
        {
            tracing::debug!(
                "Rejected duplicate author {} {}",
                data.first_name,
                data.last_name
            );
            return Err(AppError::Conflict(
                "Author with this name already exists".to_string(),
            ));
        }

        let author = self.authors.insert(data).await?;
        tracing::info!("Created author {} ({} {})", author.id, author.first_name, author.last_name);
        Ok(author)
    }

    /// List authors with optional name search
    pub async fn find_all(&self, query: &AuthorQuery) -> AppResult<Paginated<Author>> {
        let pagination = Pagination::new(query.page, query.limit)?;
        let filter = match query.search.as_deref() {
            Some(search) if !search.is_empty() => Filter::any_contains(SEARCH_COLUMNS, search),
            _ => Filter::all(),
        };

        let (data, total) = self.authors.find_and_count(&filter, pagination).await?;
        Ok(Paginated::new(data, total, pagination))
    }

    /// Get an author with their books; `None` when absent
    pub async fn find_one(&self, id: i32) -> AppResult<Option<Author>> {
        self.authors.find_with_books(id).await
    }

    /// Overlay the provided fields onto an existing author.
    ///
    /// The name pair is not re-checked for uniqueness here.
    pub async fn update(&self, id: i32, data: &UpdateAuthor) -> AppResult<Option<Author>> {
        let Some(mut author) = self.find_one(id).await? else {
            return Ok(None);
        };

        data.apply_to(&mut author);
        let books = author.books.take();
        let mut saved = self.authors.save(&author).await?;
        saved.books = books;

        tracing::info!("Updated author {}", id);
        Ok(Some(saved))
    }

    /// Delete an author without books. `Ok(false)` when absent.
    pub async fn remove(&self, id: i32) -> AppResult<bool> {
        let Some(author) = self.find_one(id).await? else {
            return Ok(false);
        };

        if author.has_books() {
            tracing::debug!("Refused to delete author {} with books", id);
            return Err(AppError::Conflict(
                "Cannot delete author with associated books".to_string(),
            ));
        }

        self.authors.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(true)
    }
}
