//! Environment-sourced authentication configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::permissions::BaselineTemplate;

pub const DEFAULT_ISSUER: &str = "workdesk";
pub const DEFAULT_AUDIENCE: &str = "workdesk-api";
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 900;
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("cannot load permission template {path}: {reason}")]
    Template { path: PathBuf, reason: String },
}

/// Token and store settings consumed by the auth layer.
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    /// Falls back to `access_secret`; the embedded token type still keeps the
    /// two token kinds apart.
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: Duration,
    pub permission_template_path: Option<PathBuf>,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("store_timeout", &self.store_timeout)
            .field("permission_template_path", &self.permission_template_path)
            .finish()
    }
}

impl AuthConfig {
    /// Defaults for everything except the signing secret.
    pub fn new(access_secret: impl Into<String>) -> Self {
        let access_secret = access_secret.into();
        Self {
            refresh_secret: access_secret.clone(),
            access_secret,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            permission_template_path: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_secret =
            get("JWT_ACCESS_TOKEN_SECRET").ok_or(ConfigError::Missing("JWT_ACCESS_TOKEN_SECRET"))?;
        let mut config = Self::new(access_secret);

        if let Some(secret) = get("JWT_REFRESH_TOKEN_SECRET") {
            config.refresh_secret = secret;
        }
        if let Some(issuer) = get("JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Some(audience) = get("JWT_AUDIENCE") {
            config.audience = audience;
        }
        if let Some(raw) = get("JWT_ACCESS_TOKEN_TTL_SECS") {
            config.access_ttl = Duration::from_secs(parse_positive("JWT_ACCESS_TOKEN_TTL_SECS", &raw)?);
        }
        if let Some(raw) = get("JWT_REFRESH_TOKEN_TTL_SECS") {
            config.refresh_ttl =
                Duration::from_secs(parse_positive("JWT_REFRESH_TOKEN_TTL_SECS", &raw)?);
        }
        if let Some(raw) = get("STORE_TIMEOUT_MS") {
            config.store_timeout = Duration::from_millis(parse_positive("STORE_TIMEOUT_MS", &raw)?);
        }
        config.permission_template_path = get("PERMISSION_TEMPLATE_PATH").map(PathBuf::from);

        if config.refresh_ttl <= config.access_ttl {
            return Err(ConfigError::Invalid {
                key: "JWT_REFRESH_TOKEN_TTL_SECS",
                reason: "must be longer than the access token TTL".to_string(),
            });
        }

        Ok(config)
    }

    /// Load the baseline template from `permission_template_path`, or the
    /// built-in template when unset.
    pub fn load_baseline(&self) -> Result<BaselineTemplate, ConfigError> {
        let Some(path) = &self.permission_template_path else {
            return Ok(BaselineTemplate::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Template {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        BaselineTemplate::from_json(&raw).map_err(|e| ConfigError::Template {
            path: path.clone(),
            reason: e.to_string(),
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}
