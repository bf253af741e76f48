//! Toy bank: each user holds a balance they can deposit into and withdraw from.

use axum::{extract::State, routing::post, Router};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::ApiError;
use super::extract::Json;
use crate::config::Config;
use crate::db::{BalanceResponse, BankProfile, MoneyRequest, Role};

pub struct BankState {
    pub auth: AuthContext<BankProfile>,
}

impl BankState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
        })
    }
}

impl AuthState for BankState {
    type Profile = BankProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<BankProfile> {
        &self.auth
    }
}

/// A strictly positive amount; zero counts as "not provided".
fn amount(req: &MoneyRequest) -> Result<i64, ApiError> {
    match req.money {
        None | Some(0) => Err(ApiError::bad_request("Not provided money amount")),
        Some(money) if money < 0 => Err(ApiError::validation_field(
            "money",
            "Amount must not be negative",
        )),
        Some(money) => Ok(money),
    }
}

async fn deposit(
    State(state): State<Arc<BankState>>,
    user: CurrentUser<BankProfile>,
    Json(req): Json<MoneyRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let money = amount(&req)?;

    let balance = state
        .auth
        .credentials
        .update_profile(user.username(), |profile| -> Result<i64, ApiError> {
            let balance = profile
                .balance
                .checked_add(money)
                .ok_or_else(|| ApiError::bad_request("Balance would overflow"))?;
            profile.balance = balance;
            Ok(balance)
        })
        .ok_or_else(ApiError::invalid_credentials)??;

    tracing::info!(username = %user.username(), money, "Deposit");
    Ok(Json(BalanceResponse {
        message: "Successfully deposited".to_string(),
        balance,
    }))
}

async fn withdraw(
    State(state): State<Arc<BankState>>,
    user: CurrentUser<BankProfile>,
    Json(req): Json<MoneyRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let money = amount(&req)?;

    let balance = state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            if money > profile.balance {
                return Err(ApiError::bad_request("Not enough funds"));
            }
            profile.balance -= money;
            Ok(profile.balance)
        })
        .ok_or_else(ApiError::invalid_credentials)??;

    tracing::info!(username = %user.username(), money, "Withdrawal");
    Ok(Json(BalanceResponse {
        message: "Successfully withdrawn".to_string(),
        balance,
    }))
}

pub fn router(state: Arc<BankState>) -> Router {
    Router::new()
        .merge(auth_routes::<BankState>())
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn setup() -> (Router, String) {
        let app = router(Arc::new(BankState::new(&Config::test()).unwrap()));
        let token = register_and_login(&app, "alice", "pw1").await;
        (app, token)
    }

    async fn post_money(
        app: &Router,
        token: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        send(app, json_request(Method::POST, uri, Some(token), body)).await
    }

    #[tokio::test]
    async fn test_deposit_then_withdraw() {
        let (app, token) = setup().await;

        let (status, body) = post_money(&app, &token, "/deposit", json!({"money": 100})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 100);

        let (status, body) = post_money(&app, &token, "/withdraw", json!({"money": 30})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], 70);

        let (_, me) = send(&app, get_request("/users/me", Some(&token))).await;
        assert_eq!(me["balance"], 70);
        assert_eq!(me["username"], "alice");
    }

    #[tokio::test]
    async fn test_overdraw_is_refused_and_balance_kept() {
        let (app, token) = setup().await;
        post_money(&app, &token, "/deposit", json!({"money": 10})).await;

        let (status, body) = post_money(&app, &token, "/withdraw", json!({"money": 11})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Not enough funds");

        let (_, me) = send(&app, get_request("/me", Some(&token))).await;
        assert_eq!(me["balance"], 10);
    }

    #[tokio::test]
    async fn test_missing_zero_and_negative_amounts() {
        let (app, token) = setup().await;

        for body in [json!({}), json!({"money": 0}), json!({"money": null})] {
            let (status, res) = post_money(&app, &token, "/deposit", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(res["error"]["message"], "Not provided money amount");
        }

        let (status, _) = post_money(&app, &token, "/withdraw", json!({"money": -5})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_requires_token() {
        let (app, _) = setup().await;
        let (status, _) = send(
            &app,
            json_request(Method::POST, "/deposit", None, json!({"money": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
