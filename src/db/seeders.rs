//! Demo data loaded at startup when `seed.enabled` is set.
//!
//! Each seeder fills the stores of one app with the users and records that
//! exercise starts from. Every seeded user logs in with `seed.password`.

use anyhow::Result;
use std::collections::BTreeMap;
use tracing::info;

use crate::auth::credentials::NewUser;
use crate::auth::Credentials;
use crate::db::{
    BankProfile, Budget, BudgetsProfile, Issue, IssueStatus, NoProfile, Note, NotesProfile,
    Purchase, Role, SharedStore,
};

async fn seed_user<P: Clone + Send + Sync + 'static>(
    credentials: &Credentials<P>,
    username: &str,
    full_name: Option<&str>,
    role: Role,
    password: &str,
    profile: P,
) -> Result<()> {
    credentials
        .register(NewUser {
            username: username.to_string(),
            password: password.to_string(),
            full_name: full_name.map(str::to_string),
            role,
            profile,
        })
        .await?;
    info!(username, role = %role, "Seeded user");
    Ok(())
}

/// Bank: `admin` with a balance of 1000
pub async fn seed_bank(credentials: &Credentials<BankProfile>, password: &str) -> Result<()> {
    seed_user(
        credentials,
        "admin",
        None,
        Role::User,
        password,
        BankProfile { balance: 1000 },
    )
    .await
}

/// Notes: `andrew` with one note
pub async fn seed_notes(credentials: &Credentials<NotesProfile>, password: &str) -> Result<()> {
    let note = Note {
        id: 0,
        title: "My First Note".to_string(),
        content: "That is my first note".to_string(),
    };
    let profile = NotesProfile {
        notes: BTreeMap::from([(note.id, note)]),
    };
    seed_user(credentials, "andrew", None, Role::User, password, profile).await
}

/// Budgets: `user` with a Groceries budget and one purchase
pub async fn seed_budgets(credentials: &Credentials<BudgetsProfile>, password: &str) -> Result<()> {
    let groceries = Budget {
        budget: "Groceries".to_string(),
        limit: 300.0,
        purchases: vec![Purchase {
            description: "Milk and eggs".to_string(),
            amount: 20.0,
        }],
    };
    let profile = BudgetsProfile {
        budgets: BTreeMap::from([(groceries.budget.clone(), groceries)]),
    };
    seed_user(credentials, "user", Some("username"), Role::User, password, profile).await
}

/// Issues: reporter `alice`, developer `bob`, one assigned and one open issue
pub async fn seed_issues(
    credentials: &Credentials<NoProfile>,
    issues: &SharedStore<u64, Issue>,
    password: &str,
) -> Result<()> {
    seed_user(
        credentials,
        "alice",
        Some("Alice Reporter"),
        Role::Reporter,
        password,
        NoProfile::default(),
    )
    .await?;
    seed_user(
        credentials,
        "bob",
        Some("Bob Developer"),
        Role::Developer,
        password,
        NoProfile::default(),
    )
    .await?;

    let seeded = [
        (
            "Bug in login page",
            "Login button doesn't work on mobile.",
            Some("bob"),
        ),
        (
            "Typo in homepage header",
            "Header says 'Welcom' instead of 'Welcome'.",
            None,
        ),
    ];
    for (title, description, assignee) in seeded {
        let issue = issues.insert_next(&mut |id| Issue {
            id: *id,
            title: title.to_string(),
            description: Some(description.to_string()),
            status: IssueStatus::Open,
            reporter: "alice".to_string(),
            assignee: assignee.map(str::to_string),
        });
        info!(id = issue.id, title = %issue.title, "Seeded issue");
    }
    Ok(())
}
