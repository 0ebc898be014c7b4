//! Business logic services

pub mod authors;
pub mod books;

use std::sync::Arc;

use crate::repository::{AuthorStore, BookStore, Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    repository: Option<Repository>,
}

impl Services {
    /// Create all services backed by the PostgreSQL repository
    pub fn new(repository: Repository) -> Self {
        let authors: Arc<dyn AuthorStore> = Arc::new(repository.authors.clone());
        let books: Arc<dyn BookStore> = Arc::new(repository.books.clone());
        Self {
            repository: Some(repository),
            ..Self::from_stores(authors, books)
        }
    }

    /// Create all services over arbitrary store implementations
    pub fn from_stores(authors: Arc<dyn AuthorStore>, books: Arc<dyn BookStore>) -> Self {
        Self {
            authors: authors::AuthorsService::new(authors.clone()),
            books: books::BooksService::new(books, authors),
            repository: None,
        }
    }

    /// Check that the backing database answers; always ready without one
    pub async fn is_ready(&self) -> bool {
        match &self.repository {
            Some(repository) => match repository.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Readiness check failed: {}", e);
                    false
                }
            },
            None => true,
        }
    }
}
