use serde::{Deserialize, Serialize};

use crate::db::OneShot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub is_read: OneShot,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub receiver: String,
    pub text: String,
}
