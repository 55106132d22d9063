//! Per-request authorization gate.
//!
//! Extract → verify → re-resolve → consistency check → authorize. The first
//! failing step ends the request. Transport-agnostic: the HTTP layer passes
//! in the raw `Authorization` header value and maps the error once.

use std::sync::Arc;
use std::time::Duration;

use workdesk_core::{RoleId, UserId};

use crate::authorize::{Requirement, authorize};
use crate::error::{AuthError, Unauthenticated};
use crate::permissions::{BaselineTemplate, PermissionError, PermissionMatrix};
use crate::roles::effective_permission;
use crate::store::{PermissionStore, ResolvedRole, bounded};
use crate::token::{TokenError, TokenService};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller attached to a request that passed the gate.
///
/// Built from the freshly resolved role, never from the token snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub role_name: String,
    /// Stored overrides of the role.
    pub overrides: PermissionMatrix,
    pub permission: PermissionMatrix,
}

/// Extract the credential from an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, Unauthenticated> {
    let header = header.ok_or(Unauthenticated::MissingCredential)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(Unauthenticated::MalformedCredential)?
        .trim();

    if token.is_empty() {
        return Err(Unauthenticated::MalformedCredential);
    }
    Ok(token)
}

pub struct AuthGate {
    tokens: Arc<TokenService>,
    permissions: Arc<dyn PermissionStore>,
    baseline: Arc<BaselineTemplate>,
    store_timeout: Duration,
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenService>,
        permissions: Arc<dyn PermissionStore>,
        baseline: Arc<BaselineTemplate>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            permissions,
            baseline,
            store_timeout,
        }
    }

    pub fn baseline(&self) -> &BaselineTemplate {
        &self.baseline
    }

    /// Declare a route requirement, failing on names the baseline lacks.
    pub fn requirement(&self, group: &str, action: &str) -> Result<Requirement, PermissionError> {
        self.baseline.key(group, action).map(Requirement::Permission)
    }

    /// Run the full gate for `requirement`.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        requirement: &Requirement,
    ) -> Result<AuthContext, AuthError> {
        let ctx = self.authenticate(authorization).await?;

        match authorize(&ctx.role_name, &ctx.permission, requirement) {
            Ok(()) => {
                tracing::debug!(user_id = %ctx.user_id, role = %ctx.role_name, %requirement, "authorized");
                Ok(ctx)
            }
            Err(err) => {
                tracing::info!(user_id = %ctx.user_id, role = %ctx.role_name, %requirement, "permission denied");
                Err(err)
            }
        }
    }

    /// Steps one to four: establish who the caller is right now.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = extract_bearer(authorization).inspect_err(|reason| {
            tracing::debug!(%reason, "rejecting request without usable credential");
        })?;

        let claims = self.tokens.verify_access_token(token).map_err(|err| match err {
            TokenError::Expired => AuthError::SessionExpired,
            other => {
                tracing::info!(error = %other, "access token rejected");
                AuthError::from(Unauthenticated::InvalidToken)
            }
        })?;

        let resolved = bounded(
            "resolve_role",
            self.store_timeout,
            self.permissions.resolve_role(claims.sub),
        )
        .await?;

        let Some(ResolvedRole {
            active,
            role_id,
            role_name,
            permission: overrides,
        }) = resolved
        else {
            tracing::warn!(user_id = %claims.sub, "token subject no longer exists");
            return Err(Unauthenticated::UnknownUser.into());
        };

        if !active {
            tracing::info!(user_id = %claims.sub, "token subject is deactivated");
            return Err(Unauthenticated::InactiveUser.into());
        }

        if role_id != claims.role.id {
            tracing::warn!(
                user_id = %claims.sub,
                token_role = %claims.role.id,
                current_role = %role_id,
                "token role does not match current assignment"
            );
            return Err(Unauthenticated::RoleMismatch.into());
        }

        let permission = effective_permission(&role_name, &overrides, &self.baseline).map_err(|e| {
            tracing::error!(%role_id, error = %e, "stored role permissions fail template validation");
            AuthError::ServiceUnavailable(e.to_string())
        })?;

        Ok(AuthContext {
            user_id: claims.sub,
            role_id,
            role_name,
            overrides,
            permission,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;

    use super::*;
    use crate::claims::RoleClaim;
    use crate::config::AuthConfig;
    use crate::error::StoreError;
    use crate::roles::SUPER_ADMIN;

    #[derive(Default)]
    struct FakePermissions {
        users: RwLock<HashMap<UserId, ResolvedRole>>,
        delay: Option<Duration>,
    }

    impl FakePermissions {
        fn set(&self, user: UserId, role: ResolvedRole) {
            self.users.write().unwrap().insert(user, role);
        }
    }

    #[async_trait]
    impl PermissionStore for FakePermissions {
        async fn resolve_role(&self, user_id: UserId) -> Result<Option<ResolvedRole>, StoreError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.users.read().unwrap().get(&user_id).cloned())
        }
    }

    fn baseline() -> Arc<BaselineTemplate> {
        Arc::new(
            BaselineTemplate::new(
                PermissionMatrix::new()
                    .with("documents", "write", false)
                    .with("documents", "read", true),
            )
            .unwrap(),
        )
    }

    struct Fixture {
        gate: AuthGate,
        tokens: Arc<TokenService>,
        store: Arc<FakePermissions>,
        user: UserId,
        role: ResolvedRole,
    }

    fn fixture_with(store: FakePermissions) -> Fixture {
        let tokens = Arc::new(TokenService::new(&AuthConfig::new("gate-secret")));
        let store = Arc::new(store);
        let gate = AuthGate::new(
            tokens.clone(),
            store.clone(),
            baseline(),
            Duration::from_millis(50),
        );

        let user = UserId::new();
        let role = ResolvedRole {
            active: true,
            role_id: RoleId::new(),
            role_name: "Editor".to_string(),
            permission: PermissionMatrix::new().with("documents", "write", true),
        };
        store.set(user, role.clone());

        Fixture {
            gate,
            tokens,
            store,
            user,
            role,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(FakePermissions::default())
    }

    impl Fixture {
        fn bearer(&self) -> String {
            let claim = RoleClaim {
                id: self.role.role_id,
                name: self.role.role_name.clone(),
                permission: baseline().effective(&self.role.permission).unwrap(),
            };
            format!("Bearer {}", self.tokens.issue_access_token(self.user, claim).unwrap())
        }

        fn write(&self) -> Requirement {
            self.gate.requirement("documents", "write").unwrap()
        }
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(None), Err(Unauthenticated::MissingCredential));
        assert_eq!(extract_bearer(Some("abc")), Err(Unauthenticated::MalformedCredential));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(Unauthenticated::MalformedCredential));
        assert_eq!(extract_bearer(Some("Bearer   ")), Err(Unauthenticated::MalformedCredential));
    }

    #[test]
    fn unknown_requirement_fails_at_declaration() {
        let fx = fixture();
        assert!(fx.gate.requirement("documents", "publish").is_err());
    }

    #[tokio::test]
    async fn grants_with_effective_matrix_and_attaches_context() {
        let fx = fixture();
        let ctx = fx.gate.authorize(Some(fx.bearer().as_str()), &fx.write()).await.unwrap();

        assert_eq!(ctx.user_id, fx.user);
        assert_eq!(ctx.role_id, fx.role.role_id);
        assert_eq!(ctx.permission.get("documents", "read"), Some(true));
        assert_eq!(ctx.permission.get("documents", "write"), Some(true));
    }

    #[tokio::test]
    async fn revoked_permission_applies_to_an_existing_token() {
        let fx = fixture();
        let bearer = fx.bearer();
        assert!(fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.is_ok());

        let mut revoked = fx.role.clone();
        revoked.permission = PermissionMatrix::new().with("documents", "write", false);
        fx.store.set(fx.user, revoked);

        let err = fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.unwrap_err();
        assert_eq!(err, AuthError::Forbidden("documents.write".to_string()));
    }

    #[tokio::test]
    async fn reassigned_role_invalidates_token() {
        let fx = fixture();
        let bearer = fx.bearer();

        let mut moved = fx.role.clone();
        moved.role_id = RoleId::new();
        fx.store.set(fx.user, moved);

        let err = fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(Unauthenticated::RoleMismatch));
    }

    #[tokio::test]
    async fn deactivated_or_missing_user_is_unauthenticated() {
        let fx = fixture();
        let bearer = fx.bearer();

        let mut inactive = fx.role.clone();
        inactive.active = false;
        fx.store.set(fx.user, inactive);
        let err = fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(Unauthenticated::InactiveUser));

        fx.store.users.write().unwrap().clear();
        let err = fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(Unauthenticated::UnknownUser));
    }

    #[tokio::test]
    async fn expired_token_is_session_expired() {
        let fx = fixture();
        let claim = RoleClaim {
            id: fx.role.role_id,
            name: fx.role.role_name.clone(),
            permission: PermissionMatrix::new(),
        };
        let issued_at = chrono::Utc::now() - fx.tokens.access_ttl() - chrono::Duration::seconds(5);
        let token = fx.tokens.issue_access_token_at(fx.user, claim, issued_at).unwrap();

        let err = fx
            .gate
            .authorize(Some(format!("Bearer {token}").as_str()), &fx.write())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::SessionExpired);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_credential() {
        let fx = fixture();
        let refresh = fx.tokens.issue_refresh_token(fx.user).unwrap();

        let err = fx
            .gate
            .authorize(Some(format!("Bearer {refresh}").as_str()), &fx.write())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(Unauthenticated::InvalidToken));
    }

    #[tokio::test]
    async fn super_role_bypasses_matrix() {
        let fx = fixture();
        let super_role = ResolvedRole {
            active: true,
            role_id: RoleId::new(),
            role_name: SUPER_ADMIN.to_string(),
            permission: PermissionMatrix::new(),
        };
        let root = UserId::new();
        fx.store.set(root, super_role.clone());

        let claim = RoleClaim {
            id: super_role.role_id,
            name: SUPER_ADMIN.to_string(),
            permission: PermissionMatrix::new(),
        };
        let bearer = format!("Bearer {}", fx.tokens.issue_access_token(root, claim).unwrap());

        assert!(fx.gate.authorize(Some(bearer.as_str()), &fx.write()).await.is_ok());
        assert!(fx.gate.authorize(Some(bearer.as_str()), &Requirement::SuperAdmin).await.is_ok());
    }

    #[tokio::test]
    async fn slow_store_is_service_unavailable() {
        let fx = fixture_with(FakePermissions {
            delay: Some(Duration::from_millis(500)),
            ..Default::default()
        });

        let err = fx.gate.authorize(Some(fx.bearer().as_str()), &fx.write()).await.unwrap_err();
        assert_eq!(err.code(), "service_unavailable");
    }
}
