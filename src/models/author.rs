//! Author model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::Book;
use crate::repository::filter::{FieldValue, Filterable};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Books written by this author, only loaded on single-author lookups
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books: Option<Vec<Book>>,
}

impl Author {
    /// Whether at least one book references this author.
    ///
    /// Only meaningful when `books` was loaded.
    pub fn has_books(&self) -> bool {
        self.books.as_ref().is_some_and(|books| !books.is_empty())
    }
}

impl Filterable for Author {
    fn field(&self, column: &str) -> Option<FieldValue<'_>> {
        match column {
            "first_name" => Some(FieldValue::Text(&self.first_name)),
            "last_name" => Some(FieldValue::Text(&self.last_name)),
            _ => None,
        }
    }
}

/// Create author request
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "firstName should not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "lastName should not be empty"))]
    pub last_name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Update author request; omitted fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthor {
    #[validate(length(min = 1, message = "firstName should not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "lastName should not be empty"))]
    pub last_name: Option<String>,
    /// `Some(None)` clears the column (explicit `null`)
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub birth_date: Option<Option<NaiveDate>>,
}

impl UpdateAuthor {
    /// Overlay the provided fields onto `author`
    pub fn apply_to(&self, author: &mut Author) {
        if let Some(ref first_name) = self.first_name {
            author.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            author.last_name = last_name.clone();
        }
        if let Some(ref bio) = self.bio {
            author.bio = bio.clone();
        }
        if let Some(birth_date) = self.birth_date {
            author.birth_date = birth_date;
        }
    }
}

/// Author list query parameters
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AuthorQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    pub page: Option<i64>,
    /// Records per page (default: 10)
    #[validate(range(min = 1, message = "limit must not be less than 1"))]
    pub limit: Option<i64>,
    /// Substring matched against first and last name
    pub search: Option<String>,
}
