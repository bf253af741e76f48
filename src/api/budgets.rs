//! Budget tracker: named budgets with purchases and a spend status.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Path};
use super::validation::{validate_amount, validate_text};
use crate::config::Config;
use crate::db::{
    Budget, BudgetStatus, BudgetsProfile, CreateBudgetRequest, MessageResponse, Purchase, Role,
};

pub struct BudgetsState {
    pub auth: AuthContext<BudgetsProfile>,
}

impl BudgetsState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
        })
    }
}

impl AuthState for BudgetsState {
    type Profile = BudgetsProfile;
    const ROLES: &'static [Role] = &[Role::User];

    fn auth(&self) -> &AuthContext<BudgetsProfile> {
        &self.auth
    }
}

fn not_found(name: &str) -> ApiError {
    ApiError::not_found(format!("Budget {} not found", name))
}

async fn create_budget(
    State(state): State<Arc<BudgetsState>>,
    user: CurrentUser<BudgetsProfile>,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("budget", validate_text("Budget name", &req.budget))
        .check("limit", validate_amount(req.limit));
    errors.finish()?;

    let name = req.budget.clone();
    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            if profile.budgets.contains_key(&req.budget) {
                return Err(ApiError::conflict(format!(
                    "Budget {} already exists",
                    req.budget
                )));
            }
            profile.budgets.insert(
                req.budget.clone(),
                Budget {
                    budget: req.budget,
                    limit: req.limit,
                    purchases: Vec::new(),
                },
            );
            Ok(())
        })
        .ok_or_else(ApiError::invalid_credentials)??;

    tracing::debug!(username = %user.username(), budget = %name, "Budget created");
    Ok(Json(MessageResponse::new(format!(
        "Successfully created budget {}",
        name
    ))))
}

async fn add_purchase(
    State(state): State<Arc<BudgetsState>>,
    user: CurrentUser<BudgetsProfile>,
    Path(name): Path<String>,
    Json(purchase): Json<Purchase>,
) -> Result<Json<BudgetStatus>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("description", validate_text("Description", &purchase.description))
        .check("amount", validate_amount(purchase.amount));
    errors.finish()?;

    state
        .auth
        .credentials
        .update_profile(user.username(), |profile| {
            profile.budgets.get_mut(&name).map(|budget| {
                budget.purchases.push(purchase);
                budget.status()
            })
        })
        .flatten()
        .map(Json)
        .ok_or_else(|| not_found(&name))
}

async fn budget_status(
    user: CurrentUser<BudgetsProfile>,
    Path(name): Path<String>,
) -> Result<Json<BudgetStatus>, ApiError> {
    user.0
        .profile
        .budgets
        .get(&name)
        .map(|budget| Json(budget.status()))
        .ok_or_else(|| not_found(&name))
}

/// Status of every budget, in name order
async fn budgets_overview(user: CurrentUser<BudgetsProfile>) -> Json<Vec<BudgetStatus>> {
    Json(user.0.profile.budgets.values().map(Budget::status).collect())
}

pub fn router(state: Arc<BudgetsState>) -> Router {
    Router::new()
        .merge(auth_routes::<BudgetsState>())
        .route("/budgets", post(create_budget))
        .route("/budgets/overview", get(budgets_overview))
        .route("/budgets/:name/purchases", post(add_purchase))
        .route("/budgets/:name/status", get(budget_status))
        .with_state(state)
}
