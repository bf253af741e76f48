//! Direct messages between users of the app.

use axum::{
    extract::State,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::ApiError;
use super::extract::{Json, Path};
use super::validation::validate_text;
use crate::auth::Policy;
use crate::config::Config;
use crate::db::{
    MemoryStore, Message, MessageResponse, NoProfile, OneShot, Role, SendMessageRequest,
    SharedStore,
};

pub struct MessagesState {
    pub auth: AuthContext<NoProfile>,
    pub messages: SharedStore<u64, Message>,
}

impl MessagesState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
            messages: MemoryStore::shared(),
        })
    }
}

impl AuthState for MessagesState {
    type Profile = NoProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<NoProfile> {
        &self.auth
    }
}

async fn send_message(
    State(state): State<Arc<MessagesState>>,
    user: CurrentUser<NoProfile>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    validate_text("Text", &req.text).map_err(|e| ApiError::validation_field("text", e))?;

    if !state.auth.credentials.exists(&req.receiver) {
        return Err(ApiError::not_found(format!("User {} not found", req.receiver)));
    }

    let message = state.messages.insert_next(&mut |id| Message {
        id: *id,
        sender: user.username().to_string(),
        receiver: req.receiver.clone(),
        text: req.text.clone(),
        is_read: OneShot::default(),
    });

    tracing::debug!(id = message.id, from = %message.sender, to = %message.receiver, "Message sent");
    Ok(Json(message))
}

async fn inbox(
    State(state): State<Arc<MessagesState>>,
    user: CurrentUser<NoProfile>,
) -> Json<Vec<Message>> {
    Json(state.messages.scan(&|_, m| m.receiver == user.username()))
}

async fn sent(
    State(state): State<Arc<MessagesState>>,
    user: CurrentUser<NoProfile>,
) -> Json<Vec<Message>> {
    Json(state.messages.scan(&|_, m| m.sender == user.username()))
}

/// Only the receiver may read a message, and only once.
async fn read_message(
    State(state): State<Arc<MessagesState>>,
    user: CurrentUser<NoProfile>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let actor = user.actor();
    state
        .messages
        .update(&id, |message| {
            Policy::Owner
                .check(&actor, Some(message.receiver.as_str()))
                .map_err(|_| ApiError::forbidden("Not authorized to read this message"))?;
            message
                .is_read
                .claim()
                .map_err(|_| ApiError::conflict("Message was already read"))
        })
        .ok_or_else(|| ApiError::not_found("Message not found"))?
        .map_err(|e| {
            tracing::info!(username = %actor.username, id, "Read refused: {}", e);
            e
        })?;

    Ok(Json(MessageResponse::new("Successfully marked as read")))
}

pub fn router(state: Arc<MessagesState>) -> Router {
    Router::new()
        .merge(auth_routes::<MessagesState>())
        .route("/messages", post(send_message))
        .route("/messages/inbox", get(inbox))
        .route("/messages/sent", get(sent))
        .route("/messages/:id/read", put(read_message))
        .with_state(state)
}
