//! Personal notes kept on each user's record.

use axum::{
    extract::State,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Path};
use super::validation::validate_text;
use crate::config::Config;
use crate::db::{next_key, CreateNoteRequest, MessageResponse, Note, NotesProfile, Role};

pub struct NotesState {
    pub auth: AuthContext<NotesProfile>,
}

impl NotesState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
        })
    }
}

impl AuthState for NotesState {
    type Profile = NotesProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<NotesProfile> {
        &self.auth
    }
}

async fn list_notes(user: CurrentUser<NotesProfile>) -> Json<Vec<Note>> {
    Json(user.0.profile.notes.into_values().collect())
}

async fn create_note(
    State(state): State<Arc<NotesState>>,
    user: CurrentUser<NotesProfile>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("title", validate_text("Title", &req.title))
        .check("content", validate_text("Content", &req.content));
    errors.finish()?;

    let note = state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            let id = next_key(&profile.notes);
            let note = Note {
                id,
                title: req.title,
                content: req.content,
            };
            profile.notes.insert(id, note.clone());
            note
        })
        .ok_or_else(ApiError::invalid_credentials)?;

    tracing::debug!(username = %user.username(), id = note.id, "Note created");
    Ok(Json(note))
}

async fn delete_note(
    State(state): State<Arc<NotesState>>,
    user: CurrentUser<NotesProfile>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| profile.notes.remove(&id))
        .flatten()
        .ok_or_else(|| ApiError::not_found(format!("Not found note with id {}", id)))?;

    Ok(Json(MessageResponse::new("Successfully deleted note")))
}

pub fn router(state: Arc<NotesState>) -> Router {
    Router::new()
        .merge(auth_routes::<NotesState>())
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/:id", delete(delete_note))
        .route("/addnote", post(create_note))
        .route("/deletenote/:id", delete(delete_note))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn app() -> Router {
        router(Arc::new(NotesState::new(&Config::test()).unwrap()))
    }

    async fn add(app: &Router, token: &str, uri: &str, title: &str) -> u64 {
        let (status, body) = send(
            app,
            json_request(
                Method::POST,
                uri,
                Some(token),
                json!({"title": title, "content": "..."}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_per_user_and_reused() {
        let app = app();
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;

        assert_eq!(add(&app, &alice, "/notes", "a0").await, 0);
        assert_eq!(add(&app, &alice, "/addnote", "a1").await, 1);
        assert_eq!(add(&app, &alice, "/notes", "a2").await, 2);
        assert_eq!(add(&app, &bob, "/notes", "b0").await, 0);

        let (status, _) =
            send(&app, empty_request(Method::DELETE, "/deletenote/1", Some(&alice))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(add(&app, &alice, "/notes", "a3").await, 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_caller() {
        let app = app();
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;
        add(&app, &alice, "/notes", "mine").await;

        let (_, notes) = send(&app, get_request("/notes", Some(&alice))).await;
        assert_eq!(notes.as_array().unwrap().len(), 1);
        assert_eq!(notes[0]["title"], "mine");

        let (_, notes) = send(&app, get_request("/notes", Some(&bob))).await;
        assert!(notes.as_array().unwrap().is_empty());

        let (_, me) = send(&app, get_request("/me", Some(&alice))).await;
        assert_eq!(me["notes"]["0"]["title"], "mine");
    }

    #[tokio::test]
    async fn test_cannot_delete_someone_elses_note() {
        let app = app();
        let alice = register_and_login(&app, "alice", "pw1").await;
        let bob = register_and_login(&app, "bob", "pw2").await;
        add(&app, &alice, "/notes", "mine").await;

        let (status, _) =
            send(&app, empty_request(Method::DELETE, "/notes/0", Some(&bob))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, notes) = send(&app, get_request("/notes", Some(&alice))).await;
        assert_eq!(notes.as_array().unwrap().len(), 1);
    }
}
