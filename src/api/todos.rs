//! Todo list without accounts.

use axum::{
    extract::State,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::{Json, Query};
use super::validation::validate_text;
use crate::db::{CreateTodoRequest, MemoryStore, SharedStore, Todo, TodoQuery};

pub struct TodosState {
    pub todos: SharedStore<u64, Todo>,
}

impl TodosState {
    pub fn new() -> Self {
        Self {
            todos: MemoryStore::shared(),
        }
    }
}

impl Default for TodosState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct TodoCreated {
    pub message: &'static str,
    pub todo: Todo,
}

async fn create_todo(
    State(state): State<Arc<TodosState>>,
    Json(req): Json<CreateTodoRequest>,
) -> Result<Json<TodoCreated>, ApiError> {
    validate_text("Title", &req.title).map_err(|e| ApiError::validation_field("title", e))?;

    let todo = state.todos.insert_next(&mut |id| Todo {
        id: *id,
        title: req.title.clone(),
        completed: req.completed,
    });

    tracing::debug!(id = todo.id, "Todo created");
    Ok(Json(TodoCreated {
        message: "Successfully added",
        todo,
    }))
}

async fn list_todos(
    State(state): State<Arc<TodosState>>,
    Query(query): Query<TodoQuery>,
) -> Json<Vec<Todo>> {
    let todos = match query.completed {
        Some(completed) => state.todos.scan(&|_, todo| todo.completed == completed),
        None => state.todos.all(),
    };
    Json(todos)
}

pub fn router(state: Arc<TodosState>) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn add(app: &Router, title: &str, completed: bool) -> serde_json::Value {
        let (status, body) = send(
            app,
            json_request(
                Method::POST,
                "/todos",
                None,
                json!({"title": title, "completed": completed}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body
    }

    #[tokio::test]
    async fn test_create_returns_todo_with_first_free_id() {
        let app = router(Arc::new(TodosState::new()));
        let first = add(&app, "write tests", false).await;
        assert_eq!(first["message"], "Successfully added");
        assert_eq!(first["todo"]["id"], 0);

        let second = add(&app, "ship", true).await;
        assert_eq!(second["todo"]["id"], 1);
    }

    #[tokio::test]
    async fn test_filter_by_completed() {
        let app = router(Arc::new(TodosState::new()));
        add(&app, "a", false).await;
        add(&app, "b", true).await;
        add(&app, "c", true).await;

        let (_, all) = send(&app, get_request("/todos", None)).await;
        assert_eq!(all.as_array().unwrap().len(), 3);

        let (_, done) = send(&app, get_request("/todos?completed=true", None)).await;
        let titles: Vec<_> = done
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["b", "c"]);

        let (_, open) = send(&app, get_request("/todos?completed=false", None)).await;
        assert_eq!(open[0]["title"], "a");
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let app = router(Arc::new(TodosState::new()));
        let (status, _) = send(
            &app,
            json_request(Method::POST, "/todos", None, json!({"title": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
