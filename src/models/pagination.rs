//! Offset/limit pagination shared by the list endpoints

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Apply defaults; supplied values must be positive
    pub fn new(page: Option<i64>, limit: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err(AppError::Validation("page must not be less than 1".to_string()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must not be less than 1".to_string()));
        }
        Ok(Self { page, limit })
    }

    /// Number of records skipped before this page
    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn take(&self) -> i64 {
        self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(PaginatedAuthors = Paginated<crate::models::Author>, PaginatedBooks = Paginated<crate::models::Book>)]
pub struct Paginated<T> {
    /// Records on this page
    pub data: Vec<T>,
    /// Total number of matching records across all pages
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Records per page
    pub limit: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            limit: pagination.limit,
        }
    }
}
