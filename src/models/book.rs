//! Book model and related types

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use super::author::Author;
use crate::repository::filter::{FieldValue, Filterable};

static ISBN10: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[0-9]{9}X|[0-9]{10})$").unwrap());
static ISBN13: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{13}$").unwrap());

/// Strip the separators allowed inside an ISBN (hyphens and spaces)
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

/// Check an ISBN-10 or ISBN-13, separators allowed, including its check digit
pub fn is_valid_isbn(isbn: &str) -> bool {
    let digits = normalize_isbn(isbn);

    if ISBN10.is_match(&digits) {
        let sum: u32 = digits
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let value = if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) };
                (i as u32 + 1) * value
            })
            .sum();
        return sum % 11 == 0;
    }

    if ISBN13.is_match(&digits) {
        let values: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
        let sum: u32 = values[..12]
            .iter()
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { *d } else { d * 3 })
            .sum();
        return (10 - sum % 10) % 10 == values[12];
    }

    false
}

fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if is_valid_isbn(isbn) {
        Ok(())
    } else {
        let mut error = ValidationError::new("isbn");
        error.message = Some("isbn must be an ISBN".into());
        Err(error)
    }
}

/// Full book model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning author, loaded by every book lookup
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}

impl Filterable for Book {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "title" => Some(FieldValue::Text(&self.title)),
            "isbn" => Some(FieldValue::Text(&self.isbn)),
            "author_id" => Some(FieldValue::Int(self.author_id)),
            _ => None,
        }
    }
}

/// Create book request
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[validate(length(min = 1, message = "title should not be empty"))]
    pub title: String,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    pub published_date: Option<NaiveDate>,
    pub genre: Option<String>,
    pub author_id: i32,
}

/// Update book request; omitted fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "title should not be empty"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: Option<String>,
    /// `Some(None)` clears the column (explicit `null`)
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub published_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub genre: Option<Option<String>>,
    pub author_id: Option<i32>,
}

impl UpdateBook {
    /// Overlay the provided scalar fields onto `book`.
    ///
    /// The author association is resolved by the books service, not here.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(published_date) = self.published_date {
            book.published_date = published_date;
        }
        if let Some(ref genre) = self.genre {
            book.genre = genre.clone();
        }
    }
}

/// Book list query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    pub page: Option<i64>,
    /// Records per page (default: 10)
    #[validate(range(min = 1, message = "limit must not be less than 1"))]
    pub limit: Option<i64>,
    /// Substring matched against title and ISBN
    pub search: Option<String>,
    /// Only books by this author
    pub author_id: Option<i32>,
}
