//! Global and personal notification models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::OneShot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalNotification {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserNotification {
    pub id: u64,
    pub text: String,
    pub is_read: OneShot,
}

/// What `GET /notifications` returns, tagged with `"type"`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotificationView {
    Personal(UserNotification),
    Global(GlobalNotification),
}

#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub text: String,
}

/// Personal notifications are kept on the addressee's record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationsProfile {
    #[serde(skip)]
    pub personal: BTreeMap<u64, UserNotification>,
}
