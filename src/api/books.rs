//! Book catalog: listing, search and partial updates.

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Path, Query};
use super::validation::{validate_optional_text, validate_text};
use crate::db::{
    Book, BookSearchQuery, CreateBookRequest, MemoryStore, MessageResponse, SharedStore,
    UpdateBookRequest,
};

pub struct BooksState {
    pub books: SharedStore<u64, Book>,
}

impl BooksState {
    pub fn new() -> Self {
        Self {
            books: MemoryStore::shared(),
        }
    }
}

impl Default for BooksState {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found() -> ApiError {
    ApiError::not_found("Book with that id does not exist")
}

async fn list_books(State(state): State<Arc<BooksState>>) -> Json<Vec<Book>> {
    Json(state.books.all())
}

async fn create_book(
    State(state): State<Arc<BooksState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<Book>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("title", validate_text("Title", &req.title))
        .check("author", validate_text("Author", &req.author));
    errors.finish()?;

    let book = state.books.insert_next(&mut |id| Book {
        id: *id,
        title: req.title.clone(),
        author: req.author.clone(),
        year: req.year,
    });
    tracing::debug!(id = book.id, "Book added");
    Ok(Json(book))
}

/// Exactly one of `title` or `author`, matched case-insensitively as a substring.
async fn search_books(
    State(state): State<Arc<BooksState>>,
    Query(query): Query<BookSearchQuery>,
) -> Result<Json<Vec<Book>>, ApiError> {
    let (needle, by_title) = match (query.title, query.author) {
        (Some(title), None) => (title.to_lowercase(), true),
        (None, Some(author)) => (author.to_lowercase(), false),
        (None, None) => return Err(ApiError::bad_request("Query params are missing")),
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request(
                "Search by either title or author, not both",
            ))
        }
    };

    let books = state.books.scan(&|_, book| {
        let field = if by_title { &book.title } else { &book.author };
        field.to_lowercase().contains(&needle)
    });
    Ok(Json(books))
}

async fn get_book(
    State(state): State<Arc<BooksState>>,
    Path(id): Path<u64>,
) -> Result<Json<Book>, ApiError> {
    state.books.get(&id).map(Json).ok_or_else(not_found)
}

async fn update_book(
    State(state): State<Arc<BooksState>>,
    Path(id): Path<u64>,
    Json(patch): Json<UpdateBookRequest>,
) -> Result<Json<Book>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("title", validate_optional_text("Title", &patch.title))
        .check("author", validate_optional_text("Author", &patch.author));
    errors.finish()?;

    let book = state
        .books
        .update(&id, |book| {
            book.apply(patch);
            book.clone()
        })
        .ok_or_else(not_found)?;
    Ok(Json(book))
}

async fn delete_book(
    State(state): State<Arc<BooksState>>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.books.remove(&id).ok_or_else(not_found)?;
    Ok(Json(MessageResponse::new(format!(
        "Successfully deleted book with id {}",
        id
    ))))
}

pub fn router(state: Arc<BooksState>) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/search", get(search_books))
        .route("/books/:id", put(update_book).get(get_book).delete(delete_book))
        .with_state(state)
}
