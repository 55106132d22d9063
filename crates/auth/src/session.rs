//! Login, refresh rotation and logout.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use workdesk_core::{RoleId, UserId};

use crate::claims::RoleClaim;
use crate::error::AuthError;
use crate::gate::extract_bearer;
use crate::permissions::{BaselineTemplate, PermissionMatrix};
use crate::roles::effective_permission;
use crate::store::{CredentialVerifier, PermissionStore, RefreshTokenStore, ResolvedRole, bounded};
use crate::token::{TokenError, TokenService};

/// Role section of the login profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRole {
    #[serde(rename = "userTypeID")]
    pub user_type_id: RoleId,
    pub name: String,
    /// Effective matrix (baseline merged with the role's overrides).
    pub permission: PermissionMatrix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub username: String,
    pub user_type: ProfileRole,
    /// The baseline template, so clients can tell inherited values from overrides.
    pub pre_permission: PermissionMatrix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user_profile: UserProfile,
}

pub struct AuthSession {
    tokens: Arc<TokenService>,
    credentials: Arc<dyn CredentialVerifier>,
    permissions: Arc<dyn PermissionStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    baseline: Arc<BaselineTemplate>,
    store_timeout: Duration,
}

impl AuthSession {
    pub fn new(
        tokens: Arc<TokenService>,
        credentials: Arc<dyn CredentialVerifier>,
        permissions: Arc<dyn PermissionStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        baseline: Arc<BaselineTemplate>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            credentials,
            permissions,
            refresh_tokens,
            baseline,
            store_timeout,
        }
    }

    /// Verify credentials, issue a pair and persist the refresh token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let verified = bounded(
            "verify_credentials",
            self.store_timeout,
            self.credentials.verify_credentials(username, password),
        )
        .await?
        .ok_or_else(|| {
            tracing::info!("login rejected");
            AuthError::InvalidCredentials
        })?;

        // The account may have been deactivated or moved between the two lookups.
        let role = match self.resolve(verified.user_id).await? {
            Some(role) if role.active && role.role_id == verified.role_id => role,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let permission = self.effective(&role)?;
        let pair = self.issue_pair(verified.user_id, &role, permission.clone())?;

        bounded(
            "refresh_put",
            self.store_timeout,
            self.refresh_tokens.put(verified.user_id, pair.refresh_token.clone()),
        )
        .await?;

        tracing::info!(user_id = %verified.user_id, role = %role.role_name, "login succeeded");

        Ok(LoginOutcome {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user_profile: UserProfile {
                user_id: verified.user_id,
                username: verified.username,
                user_type: ProfileRole {
                    user_type_id: role.role_id,
                    name: role.role_name,
                    permission,
                },
                pre_permission: self.baseline.matrix().clone(),
            },
        })
    }

    /// Exchange the presented refresh token for a new pair, rotating the
    /// stored token. Every rejection is reported as [`AuthError::AccessDenied`].
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<TokenPair, AuthError> {
        let presented = extract_bearer(authorization).map_err(|reason| {
            tracing::debug!(%reason, "refresh without usable credential");
            AuthError::AccessDenied
        })?;

        let claims = self
            .tokens
            .verify_refresh_token(presented)
            .map_err(|err| {
                tracing::info!(error = %err, "refresh token rejected");
                AuthError::AccessDenied
            })?;
        let user_id = claims.sub;

        let role = match self.resolve(user_id).await? {
            Some(role) if role.active => role,
            _ => {
                tracing::info!(%user_id, "refresh for missing or deactivated user");
                return Err(AuthError::AccessDenied);
            }
        };

        let pair = self.issue_pair(user_id, &role, self.effective(&role)?)?;

        let rotated = bounded(
            "refresh_replace",
            self.store_timeout,
            self.refresh_tokens
                .replace_if_current(user_id, presented, pair.refresh_token.clone()),
        )
        .await?;

        if !rotated {
            tracing::warn!(%user_id, "stale refresh token presented");
            return Err(AuthError::AccessDenied);
        }

        tracing::debug!(%user_id, "refresh token rotated");
        Ok(pair)
    }

    /// Drop the stored refresh token. Idempotent.
    pub async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        bounded(
            "refresh_remove",
            self.store_timeout,
            self.refresh_tokens.remove(user_id),
        )
        .await?;
        tracing::info!(%user_id, "logged out");
        Ok(())
    }

    async fn resolve(&self, user_id: UserId) -> Result<Option<ResolvedRole>, AuthError> {
        Ok(bounded(
            "resolve_role",
            self.store_timeout,
            self.permissions.resolve_role(user_id),
        )
        .await?)
    }

    fn effective(&self, role: &ResolvedRole) -> Result<PermissionMatrix, AuthError> {
        effective_permission(&role.role_name, &role.permission, &self.baseline).map_err(|e| {
            tracing::error!(role_id = %role.role_id, error = %e, "stored role permissions fail template validation");
            AuthError::ServiceUnavailable(e.to_string())
        })
    }

    fn issue_pair(
        &self,
        user_id: UserId,
        role: &ResolvedRole,
        permission: PermissionMatrix,
    ) -> Result<TokenPair, AuthError> {
        let claim = RoleClaim {
            id: role.role_id,
            name: role.role_name.clone(),
            permission,
        };
        let access_token = self
            .tokens
            .issue_access_token(user_id, claim)
            .map_err(signing_failure)?;
        let refresh_token = self
            .tokens
            .issue_refresh_token(user_id)
            .map_err(signing_failure)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

fn signing_failure(err: TokenError) -> AuthError {
    tracing::error!(error = %err, "token issuance failed");
    AuthError::ServiceUnavailable(err.to_string())
}
