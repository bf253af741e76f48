//! Registration, login and the bearer-token extractor shared by every app.
//!
//! An app opts in by implementing [`AuthState`] for its state type; the
//! generic handlers here then serve `/register`, `/token` and `/me` against
//! that app's own user table.

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, BAD_LOGIN};
use super::extract::{Form, Json};
use super::validation;
use crate::auth::{credentials::NewUser, Actor, Argon2Hasher, Credentials, TokenIssuer};
use crate::config::Config;
use crate::db::{LoginForm, MessageResponse, RegisterRequest, Role, TokenResponse, UserRecord};

/// Users and tokens of one app
pub struct AuthContext<P> {
    pub credentials: Credentials<P>,
    pub tokens: TokenIssuer,
}

impl<P: Clone + Send + Sync + 'static> AuthContext<P> {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let hasher = Argon2Hasher::new(&config.auth.hasher)?;
        Ok(Self {
            credentials: Credentials::new(Arc::new(hasher)),
            tokens: TokenIssuer::from_config(&config.auth)?,
        })
    }

    pub fn issue_token(&self, username: &str) -> Result<TokenResponse, ApiError> {
        let token = self.tokens.issue(username, None).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            ApiError::internal("Failed to issue token")
        })?;
        Ok(TokenResponse::bearer(token))
    }
}

/// App state that carries a user table
pub trait AuthState: Send + Sync + 'static {
    type Profile: Clone + Default + Serialize + Send + Sync + 'static;

    /// Roles a client may ask for at registration.
    const ROLES: &'static [Role];

    fn auth(&self) -> &AuthContext<Self::Profile>;

    /// Initial profile of a newly registered user.
    fn new_profile(&self, _req: &RegisterRequest) -> Self::Profile {
        Self::Profile::default()
    }
}

/// The authenticated, active user making the request.
///
/// Rejects with 401 when the header is missing, the token fails
/// verification or names an unknown user, and with 400 for disabled users.
pub struct CurrentUser<P>(pub UserRecord<P>);

impl<P> CurrentUser<P> {
    pub fn actor(&self) -> Actor {
        Actor::new(self.0.username.clone(), self.0.role)
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

#[async_trait]
impl<S: AuthState> FromRequestParts<Arc<S>> for CurrentUser<S::Profile> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<S>) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let auth = state.auth();
        let username = auth.tokens.verify(token)?;
        let user = auth
            .credentials
            .find(&username)
            .ok_or_else(ApiError::invalid_credentials)?;

        if user.disabled {
            return Err(ApiError::bad_request("Inactive user"));
        }

        Ok(CurrentUser(user))
    }
}

/// The role a registration asks for. Apps without a plain `user` role make
/// the field mandatory; the others default to the first role they accept.
fn requested_role<S: AuthState>(req: &RegisterRequest) -> Result<Role, ApiError> {
    let allowed = || {
        S::ROLES
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let Some(raw) = req.role.as_deref() else {
        if S::ROLES.contains(&Role::User) {
            return Ok(Role::User);
        }
        return Err(ApiError::validation_field(
            "role",
            format!("Role is required, one of: {}", allowed()),
        ));
    };
    match raw.parse::<Role>() {
        Ok(role) if S::ROLES.contains(&role) => Ok(role),
        _ => Err(ApiError::validation_field(
            "role",
            format!("Role must be one of: {}", allowed()),
        )),
    }
}

/// `POST /register`
pub async fn register<S: AuthState>(
    State(state): State<Arc<S>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validation::validate_register(&req)?;
    let role = requested_role::<S>(&req)?;
    let profile = state.new_profile(&req);

    let user = state
        .auth()
        .credentials
        .register(NewUser {
            username: req.username,
            password: req.password,
            full_name: req.full_name,
            role,
            profile,
        })
        .await
        .map_err(|e| {
            tracing::info!("Registration refused: {}", e);
            ApiError::from(e)
        })?;

    tracing::info!(username = %user.username, role = %user.role, "User registered");
    Ok(Json(MessageResponse::new("User registered successfully")))
}

/// `POST /token` with an OAuth2 password form
pub async fn login<S: AuthState>(
    State(state): State<Arc<S>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let auth = state.auth();
    let user = auth
        .credentials
        .authenticate(&form.username, &form.password)
        .await
        .ok_or_else(|| {
            tracing::warn!(username = %form.username, "Failed login attempt");
            ApiError::unauthorized(BAD_LOGIN)
        })?;

    if user.disabled {
        return Err(ApiError::bad_request("Inactive user"));
    }

    tracing::info!(username = %user.username, "User logged in");
    Ok(Json(auth.issue_token(&user.username)?))
}

/// `GET /me`
pub async fn me<S: AuthState>(user: CurrentUser<S::Profile>) -> Response {
    Json(user.0.view()).into_response()
}

/// `/register`, `/me` and `/users/me` for apps that issue tokens themselves
pub fn account_routes<S: AuthState>() -> Router<Arc<S>> {
    Router::new()
        .route("/register", post(register::<S>))
        .route("/me", get(me::<S>))
        .route("/users/me", get(me::<S>))
}

/// [`account_routes`] plus the password-grant `/token`
pub fn auth_routes<S: AuthState>() -> Router<Arc<S>> {
    account_routes::<S>().route("/token", post(login::<S>))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::db::NoProfile;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use serde_json::json;

    struct TestState {
        auth: AuthContext<NoProfile>,
    }

    impl AuthState for TestState {
        type Profile = NoProfile;
        const ROLES: &'static [Role] = &[Role::User, Role::Admin];

        fn auth(&self) -> &AuthContext<NoProfile> {
            &self.auth
        }
    }

    fn app() -> (Router, Arc<TestState>) {
        let state = Arc::new(TestState {
            auth: AuthContext::from_config(&Config::test()).unwrap(),
        });
        (auth_routes::<TestState>().with_state(state.clone()), state)
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(extract_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token(&headers), None);
    }

    #[tokio::test]
    async fn test_register_login_me() {
        let (app, _) = app();
        let token = register_and_login(&app, "alice", "pw1").await;

        let (status, body) = send(&app, get_request("/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "user");
        assert!(body.get("password_hash").is_none());

        let (status, body) = send(&app, get_request("/users/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_duplicate_registration_fails_regardless_of_payload() {
        let (app, _) = app();
        let (status, _) = register_user(&app, json!({"username": "alice", "password": "pw1"})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = register_user(
            &app,
            json!({"username": "alice", "password": "other", "full_name": "A", "role": "admin"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn test_role_outside_app_set_is_rejected() {
        let (app, _) = app();
        let (status, body) =
            register_user(&app, json!({"username": "eve", "password": "pw", "role": "developer"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["details"]["role"].is_array());

        let (status, _) =
            register_user(&app, json!({"username": "root", "password": "pw", "role": "Admin"})).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_role_defaults_to_user() {
        let (app, state) = app();
        let (status, _) = register_user(&app, json!({"username": "alice", "password": "pw1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.auth.credentials.find("alice").unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn test_wrong_password_is_generic_401() {
        let (app, _) = app();
        register_user(&app, json!({"username": "alice", "password": "pw1"})).await;

        for (user, pw) in [("alice", "nope"), ("nobody", "pw1")] {
            let (status, body) = send(&app, login_request(user, pw)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"]["message"], BAD_LOGIN);
        }
    }

    #[tokio::test]
    async fn test_token_failures_are_indistinguishable() {
        let (app, state) = app();
        register_user(&app, json!({"username": "alice", "password": "pw1"})).await;

        let expired = state
            .auth
            .tokens
            .issue("alice", Some(chrono::Duration::seconds(-10)))
            .unwrap();
        let orphan = state.auth.tokens.issue("ghost", None).unwrap();
        let foreign = TokenIssuer::new(b"other", jsonwebtoken::Algorithm::HS256, chrono::Duration::minutes(5))
            .issue("alice", None)
            .unwrap();

        for token in [expired.as_str(), orphan.as_str(), foreign.as_str(), "garbage"] {
            let (status, body) = send(&app, get_request("/me", Some(token))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["error"]["message"], "Could not validate credentials");
        }

        let (status, _) = send(&app, get_request("/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_disabled_user_is_inactive_not_unauthorized() {
        let (app, state) = app();
        let token = register_and_login(&app, "alice", "pw1").await;
        state.auth.credentials.set_disabled("alice", true);

        let (status, body) = send(&app, get_request("/me", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Inactive user");

        let (status, _) = send(&app, login_request("alice", "pw1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
