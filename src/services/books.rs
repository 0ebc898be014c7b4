//! Books service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Author, Book, BookQuery, CreateBook, Paginated, Pagination, UpdateBook},
    repository::{filter::Filter, AuthorStore, BookStore},
};

/// Columns matched by the `search` parameter
const SEARCH_COLUMNS: &[&str] = &["title", "isbn"];

#[derive(Clone)]
pub struct BooksService {
    books: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorStore>,
}

impl BooksService {
    pub fn new(books: Arc<dyn BookStore>, authors: Arc<dyn AuthorStore>) -> Self {
        Self { books, authors }
    }

    async fn resolve_author(&self, author_id: i32) -> AppResult<Author> {
        self.authors.find_by_id(author_id).await?.ok_or_else(|| {
            tracing::debug!("Book references missing author {}", author_id);
            AppError::InvalidReference("Author does not exist".to_string())
        })
    }

    /// Create a book for an existing author with an unused ISBN
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let author = self.resolve_author(data.author_id).await?;

        if self.books.find_by_isbn(&data.isbn).await?.is_some() {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }

        let mut book = self.books.insert(data).await?;
        book.author.get_or_insert(author);
        tracing::info!("Created book {} ({}) for author {}", book.id, book.isbn, book.author_id);
        Ok(book)
    }

    /// List books with optional title/ISBN search, narrowed to one author
    /// when `author_id` is given
    pub async fn find_all(&self, query: &BookQuery) -> AppResult<Paginated<Book>> {
        let pagination = Pagination::new(query.page, query.limit)?;

        let mut filter = match query.search.as_deref() {
            Some(search) if !search.is_empty() => Filter::any_contains(SEARCH_COLUMNS, search),
            _ => Filter::all(),
        };
        if let Some(author_id) = query.author_id {
            filter = filter.and_equals("author_id", author_id);
        }

        let (data, total) = self.books.find_and_count(&filter, pagination).await?;
        Ok(Paginated::new(data, total, pagination))
    }

    /// Get a book with its author; `None` when absent
    pub async fn find_one(&self, id: i32) -> AppResult<Option<Book>> {
        self.books.find_by_id(id).await
    }

    /// Overlay the provided fields onto an existing book, re-validating the
    /// author reference and ISBN uniqueness when they change
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Option<Book>> {
        let Some(mut book) = self.find_one(id).await? else {
            return Ok(None);
        };

        if let Some(author_id) = data.author_id {
            let author = self.resolve_author(author_id).await?;
            book.author_id = author.id;
            book.author = Some(author);
        }

        if let Some(ref isbn) = data.isbn {
            if let Some(existing) = self.books.find_by_isbn(isbn).await? {
                if existing.id != id {
                    return Err(AppError::Conflict("ISBN already exists".to_string()));
                }
            }
        }

        data.apply_to(&mut book);
        let saved = self.books.save(&book).await?;

        tracing::info!("Updated book {}", id);
        Ok(Some(saved))
    }

    /// Delete a book. `Ok(false)` when absent.
    pub async fn remove(&self, id: i32) -> AppResult<bool> {
        if self.find_one(id).await?.is_none() {
            return Ok(false);
        }

        self.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(true)
    }
}
