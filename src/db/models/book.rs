//! Book catalog models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Only the fields that are present overwrite the stored book.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl Book {
    pub fn apply(&mut self, patch: UpdateBookRequest) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }
        if let Some(year) = patch.year {
            self.year = Some(year);
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookSearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
}
