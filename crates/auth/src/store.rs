//! Store contracts the auth layer depends on.
//!
//! Implementations live in `workdesk-infra`. Atomicity is the store's job:
//! the gate and session flow never hold locks of their own.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use workdesk_core::{RoleId, UserId};

use crate::error::StoreError;
use crate::permissions::PermissionMatrix;

/// Current role assignment of a user, as the data store sees it now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRole {
    pub active: bool,
    pub role_id: RoleId,
    pub role_name: String,
    /// Stored overrides; merged with the baseline by the caller.
    pub permission: PermissionMatrix,
}

/// Outcome of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub user_id: UserId,
    pub username: String,
    pub role_id: RoleId,
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// `None` when the user does not exist.
    async fn resolve_role(&self, user_id: UserId) -> Result<Option<ResolvedRole>, StoreError>;
}

/// One refresh token per user.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Unconditionally set the stored token.
    async fn put(&self, user_id: UserId, token: String) -> Result<(), StoreError>;

    async fn get(&self, user_id: UserId) -> Result<Option<String>, StoreError>;

    /// Remove the stored token; removing an absent entry succeeds.
    async fn remove(&self, user_id: UserId) -> Result<(), StoreError>;

    /// Atomically replace the stored token with `next` only if it currently
    /// equals `expected`. Returns whether the swap happened.
    async fn replace_if_current(
        &self,
        user_id: UserId,
        expected: &str,
        next: String,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `None` for an unknown user, a deactivated user or a wrong password,
    /// without telling them apart.
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedUser>, StoreError>;
}

/// Bound a store call by `after`, reporting expiry as [`StoreError::Timeout`].
pub async fn bounded<T, F>(op: &'static str, after: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { op, after }),
    }
}
