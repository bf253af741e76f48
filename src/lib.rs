pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod notifications;

use clap::ValueEnum;

/// The exercise apps one process can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppKind {
    Greet,
    Todos,
    Books,
    Countries,
    Bank,
    Notes,
    Expenses,
    Budgets,
    Issues,
    Messages,
    Notifications,
    Files,
    TwoFactor,
}

impl AppKind {
    pub fn description(self) -> &'static str {
        match self {
            AppKind::Greet => "Greeting with input validation",
            AppKind::Todos => "Anonymous todo list",
            AppKind::Books => "Book catalogue with search",
            AppKind::Countries => "Country catalogue with search",
            AppKind::Bank => "Per-user balance with deposits and withdrawals",
            AppKind::Notes => "Private notes per user",
            AppKind::Expenses => "Expense tracker with category summary",
            AppKind::Budgets => "Named budgets with purchases and limit status",
            AppKind::Issues => "Issue tracker with reporter, developer and admin roles",
            AppKind::Messages => "Direct messages with read receipts",
            AppKind::Notifications => "Personal and scheduled global notifications",
            AppKind::Files => "File sharing with download-once links",
            AppKind::TwoFactor => "Login with an optional one-time code",
        }
    }

    /// Name used on the command line
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_names() {
        assert_eq!(AppKind::TwoFactor.name(), "two-factor");
        assert_eq!(AppKind::from_str("books", true).unwrap(), AppKind::Books);
        assert_eq!(AppKind::value_variants().len(), 13);
    }
}
