//! User accounts and the administration rules around them.
//!
//! Accounts are never removed: deleting a user deactivates it, and every
//! authentication path only considers active accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workdesk_core::{DomainError, RoleId, UserId};

use crate::roles::Role;

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User can authenticate and act.
    #[default]
    Active,
    /// User was deleted; tokens it still holds stop working on next use.
    Deactivated,
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Deactivated => write!(f, "deactivated"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User Account
// ─────────────────────────────────────────────────────────────────────────────

/// A stored user account.
///
/// `password_hash` is an Argon2id PHC string and must never leave the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role_id: RoleId,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Request to create a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role_id: RoleId,
}

/// Partial user update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<RoleId>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Normalize and validate a username.
pub fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username cannot be empty"));
    }
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::validation("password cannot be empty"));
    }
    Ok(())
}

/// A role can be given to an account through administration only if it is
/// active and not the super-role.
pub fn ensure_assignable(role: &Role) -> Result<(), DomainError> {
    if role.is_super_admin() {
        return Err(DomainError::invariant("Can't assign the Super admin role"));
    }
    if !role.active {
        return Err(DomainError::invariant("role is not active"));
    }
    Ok(())
}

/// `actor` may deactivate `target` unless it is itself or a super-role account.
pub fn ensure_can_deactivate(
    actor: UserId,
    target: &UserAccount,
    target_role: &Role,
) -> Result<(), DomainError> {
    if actor == target.id {
        return Err(DomainError::invariant("Can't delete yourself"));
    }
    if target_role.is_super_admin() {
        return Err(DomainError::invariant("Can't delete Super admin"));
    }
    if !target.is_active() {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
