//! HTTP surface of every exercise app.
//!
//! Each app module owns its state type and builds a self-contained router;
//! [`create_router`] picks one and wraps it with the shared layers.

pub mod auth;
pub mod bank;
pub mod books;
pub mod budgets;
pub mod countries;
pub mod error;
pub mod expenses;
pub mod extract;
pub mod files;
pub mod greet;
pub mod issues;
pub mod messages;
pub mod notes;
pub mod notifications;
pub mod todos;
pub mod two_factor;
pub mod validation;

#[cfg(test)]
mod test_support;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db;
use crate::notifications::spawn_scheduled_notifications;
use crate::AppKind;

/// Build the router for one app, seeding demo data and starting background
/// jobs as configured.
pub async fn create_router(kind: AppKind, config: &Config) -> anyhow::Result<Router> {
    let seed = config.seed.enabled.then_some(config.seed.password.as_str());
    if seed.is_some() {
        tracing::info!(app = %kind.name(), "Seeding demo data");
    }

    let app = match kind {
        AppKind::Greet => greet::router(),
        AppKind::Todos => todos::router(Arc::new(todos::TodosState::new())),
        AppKind::Books => books::router(Arc::new(books::BooksState::new())),
        AppKind::Countries => countries::router(Arc::new(countries::CountriesState::new())),
        AppKind::Bank => {
            let state = Arc::new(bank::BankState::new(config)?);
            if let Some(password) = seed {
                db::seed_bank(&state.auth.credentials, password).await?;
            }
            bank::router(state)
        }
        AppKind::Notes => {
            let state = Arc::new(notes::NotesState::new(config)?);
            if let Some(password) = seed {
                db::seed_notes(&state.auth.credentials, password).await?;
            }
            notes::router(state)
        }
        AppKind::Expenses => expenses::router(Arc::new(expenses::ExpensesState::new(config)?)),
        AppKind::Budgets => {
            let state = Arc::new(budgets::BudgetsState::new(config)?);
            if let Some(password) = seed {
                db::seed_budgets(&state.auth.credentials, password).await?;
            }
            budgets::router(state)
        }
        AppKind::Issues => {
            let state = Arc::new(issues::IssuesState::new(config)?);
            if let Some(password) = seed {
                db::seed_issues(&state.auth.credentials, &state.issues, password).await?;
            }
            issues::router(state)
        }
        AppKind::Messages => messages::router(Arc::new(messages::MessagesState::new(config)?)),
        AppKind::Notifications => {
            let state = Arc::new(notifications::NotificationsState::new(config)?);
            // Detached; runs for the life of the process.
            let _ = spawn_scheduled_notifications(state.globals.clone(), &config.notifications);
            notifications::router(state)
        }
        AppKind::Files => files::router(Arc::new(files::FilesState::new(config)?)),
        AppKind::TwoFactor => two_factor::router(Arc::new(two_factor::TwoFactorState::new(config)?)),
    };

    Ok(Router::new()
        .route("/health", get(health_check))
        .merge(app)
        .layer(TraceLayer::new_for_http()))
}

async fn health_check() -> &'static str {
    "OK"
}
