//! In-memory stores used to drive the services and router without a database

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;

use bookshelf_server::{
    api,
    error::{AppError, AppResult},
    models::{Author, Book, CreateAuthor, CreateBook, Pagination},
    repository::{filter::Filter, AuthorStore, BookStore},
    services::Services,
    AppState,
};

#[derive(Default)]
struct Tables {
    authors: Vec<Author>,
    books: Vec<Book>,
    next_author_id: i32,
    next_book_id: i32,
}

impl Tables {
    fn author(&self, id: i32) -> Option<Author> {
        self.authors.iter().find(|a| a.id == id).cloned()
    }

    /// A book row joined with its author, as the PostgreSQL store returns it
    fn joined(&self, book: &Book) -> Book {
        let mut book = book.clone();
        book.author = self.author(book.author_id);
        book
    }
}

/// Both store traits over shared tables, enforcing the same constraints as
/// the SQL schema (unique ISBN, restricted author deletion)
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn author_count(&self) -> usize {
        self.lock().authors.len()
    }

    pub fn book_count(&self) -> usize {
        self.lock().books.len()
    }

    pub fn services(&self) -> Services {
        Services::from_stores(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    pub fn router(&self) -> Router {
        api::create_router(AppState {
            services: Arc::new(self.services()),
        })
    }
}

fn page<T: Clone>(rows: Vec<T>, pagination: Pagination) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let data = rows
        .into_iter()
        .skip(pagination.skip() as usize)
        .take(pagination.take() as usize)
        .collect();
    (data, total)
}

#[async_trait]
impl AuthorStore for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Author>> {
        Ok(self.lock().author(id))
    }

    async fn find_with_books(&self, id: i32) -> AppResult<Option<Author>> {
        let tables = self.lock();
        Ok(tables.author(id).map(|mut author| {
            author.books = Some(
                tables
                    .books
                    .iter()
                    .filter(|b| b.author_id == id)
                    .cloned()
                    .collect(),
            );
            author
        }))
    }

    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>> {
        Ok(self
            .lock()
            .authors
            .iter()
            .find(|a| a.first_name == first_name && a.last_name == last_name)
            .cloned())
    }

    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Author>, i64)> {
        let rows = self
            .lock()
            .authors
            .iter()
            .filter(|a| filter.matches(*a))
            .cloned()
            .collect();
        Ok(page(rows, pagination))
    }

    async fn insert(&self, data: &CreateAuthor) -> AppResult<Author> {
        let mut tables = self.lock();
        tables.next_author_id += 1;
        let now = Utc::now();
        let author = Author {
            id: tables.next_author_id,
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            bio: data.bio.clone(),
            birth_date: data.birth_date,
            created_at: now,
            updated_at: now,
            books: None,
        };
        tables.authors.push(author.clone());
        Ok(author)
    }

    async fn save(&self, author: &Author) -> AppResult<Author> {
        let mut tables = self.lock();
        let row = tables
            .authors
            .iter_mut()
            .find(|a| a.id == author.id)
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
        *row = Author {
            books: None,
            updated_at: Utc::now(),
            ..author.clone()
        };
        Ok(row.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tables = self.lock();
        if tables.books.iter().any(|b| b.author_id == id) {
            return Err(AppError::Conflict(
                "Cannot delete author with associated books".to_string(),
            ));
        }
        tables.authors.retain(|a| a.id != id);
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let tables = self.lock();
        Ok(tables
            .books
            .iter()
            .find(|b| b.id == id)
            .map(|b| tables.joined(b)))
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.lock().books.iter().find(|b| b.isbn == isbn).cloned())
    }

    async fn find_and_count(
        &self,
        filter: &Filter,
        pagination: Pagination,
    ) -> AppResult<(Vec<Book>, i64)> {
        let tables = self.lock();
        let rows = tables
            .books
            .iter()
            .filter(|b| filter.matches(*b))
            .map(|b| tables.joined(b))
            .collect();
        Ok(page(rows, pagination))
    }

    async fn insert(&self, data: &CreateBook) -> AppResult<Book> {
        let mut tables = self.lock();
        if tables.author(data.author_id).is_none() {
            return Err(AppError::InvalidReference("Author does not exist".to_string()));
        }
        if tables.books.iter().any(|b| b.isbn == data.isbn) {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }
        tables.next_book_id += 1;
        let now = Utc::now();
        let book = Book {
            id: tables.next_book_id,
            title: data.title.clone(),
            isbn: data.isbn.clone(),
            published_date: data.published_date,
            genre: data.genre.clone(),
            author_id: data.author_id,
            created_at: now,
            updated_at: now,
            author: None,
        };
        tables.books.push(book.clone());
        Ok(tables.joined(&book))
    }

    async fn save(&self, book: &Book) -> AppResult<Book> {
        let mut tables = self.lock();
        if tables.author(book.author_id).is_none() {
            return Err(AppError::InvalidReference("Author does not exist".to_string()));
        }
        if tables
            .books
            .iter()
            .any(|b| b.isbn == book.isbn && b.id != book.id)
        {
            return Err(AppError::Conflict("ISBN already exists".to_string()));
        }
        let row = tables
            .books
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
        *row = Book {
            author: None,
            updated_at: Utc::now(),
            ..book.clone()
        };
        let saved = row.clone();
        Ok(tables.joined(&saved))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.lock().books.retain(|b| b.id != id);
        Ok(())
    }
}
