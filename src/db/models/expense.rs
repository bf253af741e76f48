//! Expense tracker models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary bucket for expenses without a category
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: u64,
    pub amount: f64,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl Expense {
    pub fn apply(&mut self, patch: UpdateExpenseRequest) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = Some(category);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpensesProfile {
    pub expenses: BTreeMap<u64, Expense>,
}

impl ExpensesProfile {
    /// Total spent per category.
    pub fn summary(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for expense in self.expenses.values() {
            let category = expense
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            *totals.entry(category).or_insert(0.0) += expense.amount;
        }
        totals
    }
}
