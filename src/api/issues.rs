//! Role-based issue tracker.
//!
//! Reporters file issues, developers claim and progress them, admins assign
//! them to developers. Reading is public.

use axum::{
    extract::State,
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use super::auth::{auth_routes, AuthContext, AuthState, CurrentUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{Json, Path, Query};
use super::validation::{validate_optional_text, validate_text};
use crate::auth::{Policy, PolicyError};
use crate::config::Config;
use crate::db::{
    AssignIssueRequest, CreateIssueRequest, Issue, IssueQuery, IssueStatus, MemoryStore,
    NoProfile, Role, SharedStore, UpdateIssueStatusRequest,
};

const FILE_ISSUES: Policy<'static> = Policy::RoleIn(&[Role::Reporter]);
const CLAIM_ISSUES: Policy<'static> = Policy::Claimable(&[Role::Developer]);
const REASSIGN_ISSUES: Policy<'static> = Policy::RoleIn(&[Role::Admin]);

pub struct IssuesState {
    pub auth: AuthContext<NoProfile>,
    pub issues: SharedStore<u64, Issue>,
}

impl IssuesState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            auth: AuthContext::from_config(config)?,
            issues: MemoryStore::shared(),
        })
    }

    fn is_developer(&self, username: &str) -> bool {
        self.auth
            .credentials
            .find(username)
            .is_some_and(|user| user.role == Role::Developer)
    }
}

impl AuthState for IssuesState {
    type Profile = NoProfile;
    const ROLES: &'static [Role] = &[Role::Reporter, Role::Developer, Role::Admin];

    fn auth(&self) -> &AuthContext<NoProfile> {
        &self.auth
    }
}

fn not_found(id: u64) -> ApiError {
    ApiError::not_found(format!("Not found issue with id {}", id))
}

fn not_a_developer() -> ApiError {
    ApiError::bad_request("Assignee must be an existing developer")
}

async fn create_issue(
    State(state): State<Arc<IssuesState>>,
    user: CurrentUser<NoProfile>,
    Json(req): Json<CreateIssueRequest>,
) -> Result<Json<Issue>, ApiError> {
    FILE_ISSUES.check(&user.actor(), None).map_err(|e| {
        tracing::warn!(username = %user.username(), role = %user.0.role, "Issue creation refused");
        ApiError::from(e)
    })?;

    let mut errors = ValidationErrorBuilder::new();
    errors
        .check("title", validate_text("Title", &req.title))
        .check("description", validate_optional_text("Description", &req.description));
    errors.finish()?;

    if let Some(ref assignee) = req.assignee {
        if !state.is_developer(assignee) {
            return Err(not_a_developer());
        }
    }

    let issue = state.issues.insert_next(&mut |id| Issue {
        id: *id,
        title: req.title.clone(),
        description: req.description.clone(),
        status: IssueStatus::Open,
        reporter: user.username().to_string(),
        assignee: req.assignee.clone(),
    });

    tracing::info!(id = issue.id, reporter = %issue.reporter, "Issue filed");
    Ok(Json(issue))
}

async fn list_issues(
    State(state): State<Arc<IssuesState>>,
    Query(query): Query<IssueQuery>,
) -> Json<Vec<Issue>> {
    Json(state.issues.scan(&|_, issue| query.matches(issue)))
}

async fn get_issue(
    State(state): State<Arc<IssuesState>>,
    Path(id): Path<u64>,
) -> Result<Json<Issue>, ApiError> {
    state.issues.get(&id).map(Json).ok_or_else(|| not_found(id))
}

/// Only the assignee may move an issue through its statuses.
async fn update_status(
    State(state): State<Arc<IssuesState>>,
    user: CurrentUser<NoProfile>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateIssueStatusRequest>,
) -> Result<Json<Issue>, ApiError> {
    let actor = user.actor();
    let issue = state
        .issues
        .update(&id, |issue| {
            Policy::Owner.check(&actor, issue.assignee.as_deref())?;
            issue.status = req.status;
            Ok::<_, PolicyError>(issue.clone())
        })
        .ok_or_else(|| not_found(id))?
        .map_err(|e| {
            tracing::warn!(username = %actor.username, id, "Status change refused");
            ApiError::from(e)
        })?;

    tracing::info!(id, status = %issue.status, "Issue status changed");
    Ok(Json(issue))
}

/// An admin naming a developer reassigns; a developer without a body claims
/// an unassigned issue.
async fn assign_issue(
    State(state): State<Arc<IssuesState>>,
    user: CurrentUser<NoProfile>,
    Path(id): Path<u64>,
    body: Option<Json<AssignIssueRequest>>,
) -> Result<Json<Issue>, ApiError> {
    let actor = user.actor();

    let reassign_to = match body {
        Some(Json(req)) if REASSIGN_ISSUES.check(&actor, None).is_ok() => {
            if !state.is_developer(&req.assignee) {
                return Err(not_a_developer());
            }
            Some(req.assignee)
        }
        _ => None,
    };

    let issue = state
        .issues
        .update(&id, |issue| {
            match reassign_to {
                Some(assignee) => issue.assignee = Some(assignee),
                None => {
                    CLAIM_ISSUES
                        .check(&actor, issue.assignee.as_deref())
                        .map_err(|e| match e {
                            PolicyError::AlreadyClaimed => {
                                ApiError::bad_request("Issue is already assigned")
                            }
                            PolicyError::Forbidden => ApiError::from(e),
                        })?;
                    issue.assignee = Some(actor.username.clone());
                }
            }
            Ok::<_, ApiError>(issue.clone())
        })
        .ok_or_else(|| not_found(id))??;

    tracing::info!(
        id,
        assignee = issue.assignee.as_deref().unwrap_or_default(),
        by = %actor.username,
        "Issue assigned"
    );
    Ok(Json(issue))
}

pub fn router(state: Arc<IssuesState>) -> Router {
    Router::new()
        .merge(auth_routes::<IssuesState>())
        .route("/issues", get(list_issues).post(create_issue))
        .route("/issues/:id", get(get_issue).put(update_status))
        .route("/issues/:id/assign", put(assign_issue))
        .with_state(state)
}
