use serde::{Deserialize, Serialize};

use workdesk_core::{RoleId, UserId};

use crate::permissions::PermissionMatrix;

/// Type marker embedded in every token so the two kinds cannot be swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Role snapshot carried by an access token.
///
/// Informational only: authorization always re-resolves the role, and only
/// `id` is compared against the resolved role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaim {
    pub id: RoleId,
    pub name: String,
    pub permission: PermissionMatrix,
}

/// Claims of a short-lived access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject / user identifier.
    pub sub: UserId,
    pub role: RoleClaim,
    pub iss: String,
    pub aud: String,
    /// Issued-at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    pub jti: String,
    pub typ: TokenKind,
}

/// Claims of a long-lived refresh token. No permission data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique per issuance, so two tokens minted in the same second differ.
    pub jti: String,
    pub typ: TokenKind,
}
