//! Password login with an optional second step.
//!
//! Users who registered with `enable_2fa` get a numeric code instead of a
//! token from `/token`. There is no delivery channel, so the code is logged.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use rand::Rng;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::auth::{account_routes, AuthContext, AuthState};
use super::error::{ApiError, BAD_LOGIN};
use super::extract::{Form, Json};
use crate::config::Config;
use crate::db::{
    LoginForm, PendingCode, RegisterRequest, Role, TokenResponse, TwoFactorChallenge,
    TwoFactorProfile, VerifyCodeRequest,
};

const INVALID_CODE: &str = "Invalid or expired 2FA code";

pub struct TwoFactorState {
    pub auth: AuthContext<TwoFactorProfile>,
    /// Outstanding codes by username. A new login replaces the previous code.
    pub pending: DashMap<String, PendingCode>,
    pub code_ttl: chrono::Duration,
    pub code_length: u32,
    pub max_attempts: u32,
}

impl TwoFactorState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
            pending: DashMap::new(),
            code_ttl: chrono::Duration::seconds(config.two_factor.code_ttl_secs as i64),
            code_length: config.two_factor.code_length,
            max_attempts: config.two_factor.max_attempts,
        })
    }

    fn generate_code(&self) -> String {
        let upper = 10u32.pow(self.code_length);
        let code = rand::rng().random_range(0..upper);
        format!("{:0width$}", code, width = self.code_length as usize)
    }
}

impl AuthState for TwoFactorState {
    type Profile = TwoFactorProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<TwoFactorProfile> {
        &self.auth
    }

    fn new_profile(&self, req: &RegisterRequest) -> TwoFactorProfile {
        TwoFactorProfile {
            enable_2fa: req.enable_2fa.unwrap_or(false),
        }
    }
}

/// `POST /token`: a token, or 202 with a challenge for 2FA users
async fn login(
    State(state): State<Arc<TwoFactorState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
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

    if !user.profile.enable_2fa {
        tracing::info!(username = %user.username, "User logged in");
        return Ok(Json(auth.issue_token(&user.username)?).into_response());
    }

    let code = state.generate_code();
    state.pending.insert(
        user.username.clone(),
        PendingCode::new(code.clone(), Utc::now() + state.code_ttl),
    );
    tracing::info!(username = %user.username, code = %code, "2FA code issued");

    Ok((
        StatusCode::ACCEPTED,
        Json(TwoFactorChallenge {
            detail: "2FA code required".to_string(),
            two_factor_required: true,
        }),
    )
        .into_response())
}

/// Consume the pending code for `username` if `code` matches and has not
/// expired. A wrong guess counts against the code, which is dropped once
/// `max_attempts` guesses have failed.
fn redeem_code(state: &TwoFactorState, username: &str, code: &str) -> Result<(), ApiError> {
    let rejected = || ApiError::unauthorized(INVALID_CODE);

    let Entry::Occupied(mut entry) = state.pending.entry(username.to_string()) else {
        tracing::warn!(username, "2FA code submitted without a pending login");
        return Err(rejected());
    };

    if entry.get().is_expired(Utc::now()) {
        entry.remove();
        tracing::info!(username, "Expired 2FA code");
        return Err(rejected());
    }

    if bool::from(entry.get().code.as_bytes().ct_eq(code.as_bytes())) {
        entry.remove();
        return Ok(());
    }

    let pending = entry.get_mut();
    pending.failures += 1;
    let failures = pending.failures;
    if failures >= state.max_attempts {
        entry.remove();
        tracing::warn!(username, failures, "Too many wrong 2FA codes, pending login discarded");
    } else {
        tracing::warn!(username, failures, "Rejected 2FA code");
    }
    Err(rejected())
}

/// `POST /verify-2fa`: trade a pending code for a token, once
async fn verify_code(
    State(state): State<Arc<TwoFactorState>>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    redeem_code(&state, &req.username, &req.code)?;

    let user = state
        .auth
        .credentials
        .find(&req.username)
        .ok_or_else(|| ApiError::unauthorized(INVALID_CODE))?;
    if user.disabled {
        return Err(ApiError::bad_request("Inactive user"));
    }

    tracing::info!(username = %user.username, "User logged in with 2FA");
    Ok(Json(state.auth.issue_token(&user.username)?))
}

pub fn router(state: Arc<TwoFactorState>) -> Router {
    Router::new()
        .merge(account_routes::<TwoFactorState>())
        .route("/token", post(login))
        .route("/verify-2fa", post(verify_code))
        .with_state(state)
}
