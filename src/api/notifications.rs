//! Global and personal notifications.
//!
//! Global notifications come from admins and from the scheduled job in
//! [`crate::notifications`]. Personal ones are addressed to one user and are
//! hidden from the listing once read.

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
    next_key, GlobalNotification, MemoryStore, MessageResponse, NotificationRequest,
    NotificationView, NotificationsProfile, OneShot, Role, SharedStore, UserNotification,
};
use crate::notifications::publish_global;

const POST_GLOBAL: Policy<'static> = Policy::RoleIn(&[Role::Admin]);

pub struct NotificationsState {
    pub auth: AuthContext<NotificationsProfile>,
    pub globals: SharedStore<u64, GlobalNotification>,
}

impl NotificationsState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
            globals: MemoryStore::shared(),
        })
    }
}

impl AuthState for NotificationsState {
    type Profile = NotificationsProfile;
    const ROLES: &'static [Role] = &[Role::User, Role::Admin];

    fn auth(&self) -> &AuthContext<NotificationsProfile> {
        &self.auth
    }
}

fn validate(req: &NotificationRequest) -> Result<(), ApiError> {
    validate_text("Text", &req.text).map_err(|e| ApiError::validation_field("text", e))
}

async fn create_global(
    State(state): State<Arc<NotificationsState>>,
    user: CurrentUser<NotificationsProfile>,
    Json(req): Json<NotificationRequest>,
) -> Result<Json<GlobalNotification>, ApiError> {
    POST_GLOBAL
        .check(&user.actor(), None)
        .map_err(|_| ApiError::forbidden("Only admins can send global notifications"))?;
    validate(&req)?;

    let notification = publish_global(&state.globals, &req.text);
    tracing::info!(id = notification.id, by = %user.username(), "Global notification created");
    Ok(Json(notification))
}

async fn create_personal(
    State(state): State<Arc<NotificationsState>>,
    _user: CurrentUser<NotificationsProfile>,
    Path(username): Path<String>,
    Json(req): Json<NotificationRequest>,
) -> Result<Json<UserNotification>, ApiError> {
    validate(&req)?;

    let notification = state
        .auth
        .credentials
        .update_profile(&username, |profile| {
            let id = next_key(&profile.personal);
            let notification = UserNotification {
                id,
                text: req.text,
                is_read: OneShot::default(),
            };
            profile.personal.insert(id, notification.clone());
            notification
        })
        .ok_or_else(|| ApiError::not_found(format!("User {} not found", username)))?;

    Ok(Json(notification))
}

/// Unread personal notifications first, then every global one.
async fn list_notifications(
    State(state): State<Arc<NotificationsState>>,
    user: CurrentUser<NotificationsProfile>,
) -> Json<Vec<NotificationView>> {
    let personal = user
        .0
        .profile
        .personal
        .into_values()
        .filter(|n| !n.is_read.is_set())
        .map(NotificationView::Personal);
    let global = state.globals.all().into_iter().map(NotificationView::Global);
    Json(personal.chain(global).collect())
}

async fn mark_read(
    State(state): State<Arc<NotificationsState>>,
    user: CurrentUser<NotificationsProfile>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            profile
                .personal
                .get_mut(&id)
                .map(|notification| notification.is_read.claim())
        })
        .flatten()
        .ok_or_else(|| ApiError::not_found(format!("Notification ID {} not found", id)))?
        .map_err(|_| ApiError::conflict("Notification was already read"))?;

    Ok(Json(MessageResponse::new("Marked as read")))
}

pub fn router(state: Arc<NotificationsState>) -> Router {
    Router::new()
        .merge(auth_routes::<NotificationsState>())
        .route("/notifications", get(list_notifications))
        .route("/notifications/global", post(create_global))
        .route("/notifications/:target", post(create_personal))
        .route("/notifications/:target/read", put(mark_read))
        .with_state(state)
}
