use serde::{Deserialize, Serialize};

/// Bank users carry their balance on the user record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BankProfile {
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct MoneyRequest {
    #[serde(default)]
    pub money: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub message: String,
    pub balance: i64,
}
