//! Who may touch which record.
//!
//! A handler loads the record, then asks the policy whether the current
//! actor may act on it. Missing records are the handler's business (404)
//! and never reach here.

use thiserror::Error;

use crate::db::Role;

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Not enough permissions")]
    Forbidden,
    #[error("Already claimed")]
    AlreadyClaimed,
}

#[derive(Debug, Clone, Copy)]
pub enum Policy<'a> {
    /// Any authenticated caller.
    Anyone,
    /// Only the record's owner.
    Owner,
    /// The owner, or anyone holding one of these roles.
    OwnerOr(&'a [Role]),
    /// Anyone holding one of these roles.
    RoleIn(&'a [Role]),
    /// Callers with one of these roles may take an unowned record.
    Claimable(&'a [Role]),
}

impl Policy<'_> {
    /// `owner` is the username the record belongs to, if any.
    pub fn check(self, actor: &Actor, owner: Option<&str>) -> Result<(), PolicyError> {
        let is_owner = owner == Some(actor.username.as_str());
        let allowed = match self {
            Policy::Anyone => true,
            Policy::Owner => is_owner,
            Policy::OwnerOr(roles) => is_owner || roles.contains(&actor.role),
            Policy::RoleIn(roles) => roles.contains(&actor.role),
            Policy::Claimable(roles) => {
                if !roles.contains(&actor.role) {
                    return Err(PolicyError::Forbidden);
                }
                if owner.is_some() {
                    return Err(PolicyError::AlreadyClaimed);
                }
                true
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(PolicyError::Forbidden)
        }
    }
}
