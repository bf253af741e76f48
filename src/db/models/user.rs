//! User, role and login models.

use serde::{Deserialize, Serialize};

/// Roles the exercises hand out. Each app accepts its own subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Reporter,
    Developer,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Reporter => write!(f, "reporter"),
            Role::Developer => write!(f, "developer"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "reporter" => Ok(Role::Reporter),
            "developer" => Ok(Role::Developer),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Stored user. `P` carries the resources the app keeps on the user itself.
#[derive(Debug, Clone)]
pub struct UserRecord<P> {
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub disabled: bool,
    pub profile: P,
}

impl<P> UserRecord<P> {
    pub fn view(&self) -> UserView<'_, P> {
        UserView {
            username: &self.username,
            full_name: self.full_name.as_deref(),
            role: self.role,
            disabled: self.disabled,
            profile: &self.profile,
        }
    }
}

/// Serialisable view of a user. The password hash has no field here.
#[derive(Debug, Serialize)]
pub struct UserView<'a, P> {
    pub username: &'a str,
    pub full_name: Option<&'a str>,
    pub role: Role,
    pub disabled: bool,
    #[serde(flatten)]
    pub profile: &'a P,
}

/// Profile for apps that keep nothing on the user record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoProfile {}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, alias = "fullname")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub enable_2fa: Option<bool>,
}

/// OAuth2 password-grant form body of `POST /token`
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
