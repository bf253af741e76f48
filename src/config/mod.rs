use anyhow::{bail, Context, Result};
use jsonwebtoken::Algorithm;
use rand::Rng;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub two_factor: TwoFactorConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Symmetric signing secret for access tokens. Generated at startup when unset.
    pub secret_key: Option<String>,
    /// JWT algorithm name (HS256, HS384 or HS512)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: u64,
    #[serde(default)]
    pub hasher: HasherConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            hasher: HasherConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Parse the configured algorithm, accepting only the HMAC family.
    pub fn algorithm(&self) -> Result<Algorithm> {
        let algorithm = Algorithm::from_str(&self.algorithm.to_uppercase())
            .with_context(|| format!("Unknown token algorithm: {}", self.algorithm))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            other => bail!(
                "Token algorithm {:?} needs a key pair; only HS256, HS384 and HS512 are supported",
                other
            ),
        }
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes as i64)
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> u64 {
    30
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Deserialize)]
pub struct HasherConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 {
    argon2::Params::DEFAULT_M_COST
}

fn default_iterations() -> u32 {
    argon2::Params::DEFAULT_T_COST
}

fn default_parallelism() -> u32 {
    argon2::Params::DEFAULT_P_COST
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Seconds between scheduled global notifications (0 disables the job)
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval_secs: u64,
    #[serde(default = "default_scheduled_text")]
    pub scheduled_text: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            schedule_interval_secs: default_schedule_interval(),
            scheduled_text: default_scheduled_text(),
        }
    }
}

fn default_schedule_interval() -> u64 {
    60
}

fn default_scheduled_text() -> String {
    "Scheduled check-in: Remember to update your status!".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwoFactorConfig {
    #[serde(default = "default_code_ttl")]
    pub code_ttl_secs: u64,
    #[serde(default = "default_code_length")]
    pub code_length: u32,
    /// Wrong guesses after which a pending code is discarded
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for TwoFactorConfig {
    fn default() -> Self {
        Self {
            code_ttl_secs: default_code_ttl(),
            code_length: default_code_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_code_ttl() -> u64 {
    300
}

fn default_code_length() -> u32 {
    6
}

fn default_max_attempts() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Load the demo users and records the exercises start with
    #[serde(default)]
    pub enabled: bool,
    /// Password shared by every seeded user
    #[serde(default = "default_seed_password")]
    pub password: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            password: default_seed_password(),
        }
    }
}

fn default_seed_password() -> String {
    "secret".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.ensure_secret();
        config.validate()?;
        Ok(config)
    }

    /// Apply the `.env`-style variables the exercises are configured with.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup("SECRET_KEY").filter(|s| !s.is_empty()) {
            self.auth.secret_key = Some(secret);
        }
        if let Some(algorithm) = lookup("ALGORITHM").filter(|s| !s.is_empty()) {
            self.auth.algorithm = algorithm;
        }
        if let Some(minutes) = lookup("ACCESS_TOKEN_EXPIRE_MINUTES") {
            match minutes.trim().parse::<u64>() {
                Ok(minutes) => self.auth.access_token_expire_minutes = minutes,
                Err(_) => warn!(
                    value = %minutes,
                    "Ignoring non-numeric ACCESS_TOKEN_EXPIRE_MINUTES"
                ),
            }
        }
    }

    /// Generate a signing secret when none was configured.
    pub fn ensure_secret(&mut self) {
        if self.auth.secret_key.is_none() {
            let bytes: [u8; 32] = rand::rng().random();
            self.auth.secret_key = Some(hex::encode(bytes));
            warn!("No auth.secret_key configured; generated a random one, tokens will not survive a restart");
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.auth.secret_key.as_deref() {
            Some(secret) if !secret.is_empty() => {}
            _ => bail!("auth.secret_key must not be empty"),
        }
        self.auth.algorithm()?;
        if self.auth.access_token_expire_minutes == 0 {
            bail!("auth.access_token_expire_minutes must be greater than zero");
        }
        let hasher = &self.auth.hasher;
        argon2::Params::new(hasher.memory_kib, hasher.iterations, hasher.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid auth.hasher parameters: {}", e))?;
        if self.two_factor.code_length == 0 || self.two_factor.code_length > 9 {
            bail!("two_factor.code_length must be between 1 and 9");
        }
        if self.two_factor.max_attempts == 0 {
            bail!("two_factor.max_attempts must be greater than zero");
        }
        Ok(())
    }

    /// Fixed secret and cheap hashing so tests stay fast and deterministic.
    #[cfg(test)]
    pub fn test() -> Self {
        let mut config = Self::default();
        config.auth.secret_key = Some("test-secret".to_string());
        config.auth.hasher = HasherConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        };
        config.notifications.schedule_interval_secs = 0;
        config
    }
}
