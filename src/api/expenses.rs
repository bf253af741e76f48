//! Expense tracker: per-user expenses with a per-category summary.

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Path};
use super::validation::{validate_amount, validate_optional_text};
use crate::config::Config;
use crate::db::{
    next_key, CreateExpenseRequest, Expense, ExpensesProfile, MessageResponse, Role,
    UpdateExpenseRequest,
};

pub struct ExpensesState {
    pub auth: AuthContext<ExpensesProfile>,
}

impl ExpensesState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
        })
    }
}

impl AuthState for ExpensesState {
    type Profile = ExpensesProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<ExpensesProfile> {
        &self.auth
    }
}

fn not_found(id: u64, username: &str) -> ApiError {
    ApiError::not_found(format!("No expense with id {} for username {}", id, username))
}

async fn list_expenses(user: CurrentUser<ExpensesProfile>) -> Json<Vec<Expense>> {
    Json(user.0.profile.expenses.into_values().collect())
}

async fn create_expense(
    State(state): State<Arc<ExpensesState>>,
    user: CurrentUser<ExpensesProfile>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("amount", validate_amount(req.amount))
        .check("category", validate_optional_text("Category", &req.category));
    errors.finish()?;

    let expense = state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            let id = next_key(&profile.expenses);
            let expense = Expense {
                id,
                amount: req.amount,
                category: req.category,
                description: req.description,
            };
            profile.expenses.insert(id, expense.clone());
            expense
        })
        .ok_or_else(ApiError::invalid_credentials)?;

    Ok(Json(expense))
}

async fn update_expense(
    State(state): State<Arc<ExpensesState>>,
    user: CurrentUser<ExpensesProfile>,
    Path(id): Path<u64>,
    Json(patch): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(amount) = patch.amount {
        errors.check("amount", validate_amount(amount));
    }
    errors.check("category", validate_optional_text("Category", &patch.category));
    errors.finish()?;

    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            profile.expenses.get_mut(&id).map(|expense| {
                expense.apply(patch);
                expense.clone()
            })
        })
        .flatten()
        .map(Json)
        .ok_or_else(|| not_found(id, user.username()))
}

async fn delete_expense(
    State(state): State<Arc<ExpensesState>>,
    user: CurrentUser<ExpensesProfile>,
    Path(id): Path<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| profile.expenses.remove(&id))
        .flatten()
        .ok_or_else(|| not_found(id, user.username()))?;

    Ok(Json(MessageResponse::new("Successfully deleted expense")))
}

async fn summarize_expenses(user: CurrentUser<ExpensesProfile>) -> Json<BTreeMap<String, f64>> {
    Json(user.0.profile.summary())
}

pub fn router(state: Arc<ExpensesState>) -> Router {
    Router::new()
        .merge(auth_routes::<ExpensesState>())
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/summary", get(summarize_expenses))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn setup() -> (Router, String) {
        let app = router(Arc::new(ExpensesState::new(&Config::test()).unwrap()));
        let token = register_as(&app, "alice", "pw1", json!({"fullname": "Alice A"})).await;
        (app, token)
    }

    async fn add(app: &Router, token: &str, body: Value) -> (StatusCode, Value) {
        send(app, json_request(Method::POST, "/expenses", Some(token), body)).await
    }

    #[tokio::test]
    async fn test_summary_per_category() {
        let (app, token) = setup().await;
        add(&app, &token, json!({"amount": 10.0, "category": "food"})).await;
        add(&app, &token, json!({"amount": 5.5, "category": "food"})).await;
        add(&app, &token, json!({"amount": 3.0})).await;

        let (status, body) = send(&app, get_request("/expenses/summary", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"food": 15.5, "uncategorized": 3.0}));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (app, token) = setup().await;
        add(
            &app,
            &token,
            json!({"amount": 10.0, "category": "food", "description": "lunch"}),
        )
        .await;

        let (status, body) = send(
            &app,
            json_request(Method::PUT, "/expenses/0", Some(&token), json!({"amount": 12.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"id": 0, "amount": 12.0, "category": "food", "description": "lunch"})
        );
    }

    #[tokio::test]
    async fn test_unknown_expense_is_404() {
        let (app, token) = setup().await;
        let (status, _) = send(
            &app,
            json_request(Method::PUT, "/expenses/3", Some(&token), json!({"amount": 1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, empty_request(Method::DELETE, "/expenses/3", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_negative_amount_is_422() {
        let (app, token) = setup().await;
        let (status, _) = add(&app, &token, json!({"amount": -1.0})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_delete_and_me() {
        let (app, token) = setup().await;
        add(&app, &token, json!({"amount": 1.0})).await;
        let (status, _) =
            send(&app, empty_request(Method::DELETE, "/expenses/0", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, me) = send(&app, get_request("/me", Some(&token))).await;
        assert_eq!(me["full_name"], "Alice A");
        assert_eq!(me["expenses"], json!({}));
    }
}
