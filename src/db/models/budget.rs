//! Budget tracker models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub budget: String,
    pub limit: f64,
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub budget: String,
    pub limit: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BudgetHealth {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "OVER LIMIT")]
    OverLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetStatus {
    pub budget: String,
    pub limit: f64,
    pub spent: f64,
    pub remaining: f64,
    pub status: BudgetHealth,
}

impl Budget {
    pub fn status(&self) -> BudgetStatus {
        let spent: f64 = self.purchases.iter().map(|p| p.amount).sum();
        BudgetStatus {
            budget: self.budget.clone(),
            limit: self.limit,
            spent,
            remaining: self.limit - spent,
            status: if spent > self.limit {
                BudgetHealth::OverLimit
            } else {
                BudgetHealth::Ok
            },
        }
    }
}

/// Budgets are keyed by name on their owner's record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetsProfile {
    pub budgets: BTreeMap<String, Budget>,
}
