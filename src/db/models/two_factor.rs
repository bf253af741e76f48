//! Two-factor login models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize)]
pub struct TwoFactorProfile {
    pub enable_2fa: bool,
}

/// A code waiting to be exchanged for a token.
#[derive(Debug, Clone)]
pub struct PendingCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Wrong guesses so far
    pub failures: u32,
}

impl PendingCode {
    pub fn new(code: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at,
            failures: 0,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TwoFactorChallenge {
    pub detail: String,
    pub two_factor_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub username: String,
    pub code: String,
}
