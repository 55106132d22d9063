//! Authentication/authorization failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Why a request was classified as unauthenticated.
///
/// Kept for logs and tests; never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    MissingCredential,
    MalformedCredential,
    InvalidToken,
    UnknownUser,
    InactiveUser,
    RoleMismatch,
}

impl core::fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            Unauthenticated::MissingCredential => "missing bearer credential",
            Unauthenticated::MalformedCredential => "malformed authorization header",
            Unauthenticated::InvalidToken => "token failed verification",
            Unauthenticated::UnknownUser => "user not found",
            Unauthenticated::InactiveUser => "user is deactivated",
            Unauthenticated::RoleMismatch => "token role does not match current role",
        };
        f.write_str(reason)
    }
}

/// Every failure the auth layer reports to its callers.
///
/// Store and crypto errors are mapped into one of these before leaving the
/// crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unauthenticated: {0}")]
    Unauthenticated(Unauthenticated),

    #[error("session expired")]
    SessionExpired,

    #[error("access denied")]
    AccessDenied,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Unauthenticated(_) => "unauthenticated",
            AuthError::SessionExpired => "session_expired",
            AuthError::AccessDenied => "access_denied",
            AuthError::Forbidden(_) => "forbidden",
            AuthError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Message safe to show to the caller (no internal detail).
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid username or password",
            AuthError::Unauthenticated(_) => "authentication required",
            AuthError::SessionExpired => "session expired, refresh the access token",
            AuthError::AccessDenied => "refresh token is invalid or no longer current",
            AuthError::Forbidden(_) => "insufficient permission",
            AuthError::ServiceUnavailable(_) => "service temporarily unavailable, retry later",
        }
    }
}

impl From<Unauthenticated> for AuthError {
    fn from(reason: Unauthenticated) -> Self {
        AuthError::Unauthenticated(reason)
    }
}

/// Failure of a backing store call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store call '{op}' timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "store failure during authentication");
        AuthError::ServiceUnavailable(err.to_string())
    }
}
