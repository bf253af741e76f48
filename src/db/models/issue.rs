//! Issue tracker models.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::InProgress => write!(f, "in_progress"),
            IssueStatus::Resolved => write!(f, "resolved"),
            IssueStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub status: IssueStatus,
    pub reporter: String,
    pub assignee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "assigne")]
    pub assignee: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIssueStatusRequest {
    pub status: IssueStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignIssueRequest {
    pub assignee: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IssueQuery {
    pub status: Option<IssueStatus>,
    pub reporter: Option<String>,
    pub assignee: Option<String>,
}

impl IssueQuery {
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        if let Some(ref reporter) = self.reporter {
            if &issue.reporter != reporter {
                return false;
            }
        }
        if let Some(ref assignee) = self.assignee {
            if issue.assignee.as_ref() != Some(assignee) {
                return false;
            }
        }
        true
    }
}
