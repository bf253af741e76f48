//! Signed, time-limited bearer tokens.
//!
//! A token is a JWT carrying the username as `sub` and an absolute `exp`.
//! Nothing is stored server-side; a token dies only by expiring or by the
//! signing secret changing.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AuthConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default)]
    iat: i64,
    exp: i64,
}

/// Why a token was refused. Handlers collapse all of these into one
/// generic 401 so callers cannot tell the checks apart.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not match")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token has expired")]
    Expired,
    #[error("token has no subject")]
    MissingSubject,
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

pub struct TokenIssuer {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    default_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], algorithm: Algorithm, default_ttl: Duration) -> Self {
        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            default_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .secret_key
            .as_deref()
            .context("auth.secret_key is not set")?;
        Ok(Self::new(
            secret.as_bytes(),
            config.algorithm()?,
            config.access_token_ttl(),
        ))
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `username` expiring `ttl` (or the default) from now.
    pub fn issue(&self, username: &str, ttl: Option<Duration>) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: Some(username.to_string()),
            iat: now.timestamp(),
            exp: (now + ttl.unwrap_or(self.default_ttl)).timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// Check signature and expiry and return the subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            }
        })?;

        match data.claims.sub {
            Some(sub) if !sub.is_empty() => Ok(sub),
            _ => Err(TokenError::MissingSubject),
        }
    }
}
