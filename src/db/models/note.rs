use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: u64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
}

/// Notes live on their author's record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotesProfile {
    pub notes: BTreeMap<u64, Note>,
}
