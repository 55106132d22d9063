//! In-memory user and role directory.
//!
//! Backs role resolution and the credential check for the auth layer, and
//! carries the administration rules for accounts and roles.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use workdesk_auth::user::{ensure_assignable, ensure_can_deactivate, normalize_username, validate_password};
use workdesk_auth::{
    BaselineTemplate, CredentialVerifier, NewUser, PermissionMatrix, PermissionStore, RefreshTokenStore,
    ResolvedRole, Role, RoleUpdate, StoreError, UserAccount, UserStatus, UserUpdate, VerifiedUser,
    hash_password, verify_password,
};
use workdesk_core::{DomainError, Page, PageRequest, RoleId, UserId};

use crate::error::{InfraResult, poisoned};

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub username: String,
    pub user_type: RoleRef,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRef {
    #[serde(rename = "userTypeID")]
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<UserId, UserAccount>,
    roles: HashMap<RoleId, Role>,
}

impl DirectoryState {
    fn role(&self, id: RoleId) -> Result<&Role, DomainError> {
        self.roles.get(&id).ok_or(DomainError::NotFound)
    }

    fn visible_user(&self, id: UserId) -> Result<(&UserAccount, &Role), DomainError> {
        let user = self
            .users
            .get(&id)
            .filter(|u| u.is_active())
            .ok_or(DomainError::NotFound)?;
        let role = self.role(user.role_id)?;
        if role.is_super_admin() {
            return Err(DomainError::NotFound);
        }
        Ok((user, role))
    }

    fn ensure_username_free(&self, username: &str, except: Option<UserId>) -> Result<(), DomainError> {
        let taken = self
            .users
            .values()
            .any(|u| u.is_active() && Some(u.id) != except && u.username.eq_ignore_ascii_case(username));
        if taken {
            return Err(DomainError::conflict(format!("username '{username}' is already taken")));
        }
        Ok(())
    }

    fn ensure_role_name_free(&self, name: &str, except: Option<RoleId>) -> Result<(), DomainError> {
        let taken = self
            .roles
            .values()
            .any(|r| Some(r.id) != except && r.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(DomainError::conflict(format!("role '{name}' already exists")));
        }
        Ok(())
    }

    fn view(&self, user: &UserAccount) -> Result<UserView, DomainError> {
        let role = self.role(user.role_id)?;
        Ok(UserView {
            user_id: user.id,
            username: user.username.clone(),
            user_type: RoleRef {
                id: role.id,
                name: role.name.clone(),
            },
            status: user.status,
            created_at: user.created_at,
        })
    }
}

pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    super_role: RoleId,
    baseline: Arc<BaselineTemplate>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl InMemoryDirectory {
    /// An empty directory holding only the super-role.
    pub fn new(baseline: Arc<BaselineTemplate>, refresh_tokens: Arc<dyn RefreshTokenStore>) -> Self {
        let super_role = Role::super_admin();
        let mut state = DirectoryState::default();
        let super_role_id = super_role.id;
        state.roles.insert(super_role.id, super_role);

        Self {
            state: RwLock::new(state),
            super_role: super_role_id,
            baseline,
            refresh_tokens,
        }
    }

    pub fn baseline(&self) -> &BaselineTemplate {
        &self.baseline
    }

    pub fn super_role_id(&self) -> RoleId {
        self.super_role
    }

    /// Create a super-role account. Only for seeding at startup.
    pub async fn bootstrap_super_admin(&self, username: &str, password: &str) -> InfraResult<UserId> {
        let account = self.new_account(username, password, self.super_role).await?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.ensure_username_free(&account.username, None)?;

        let id = account.id;
        tracing::info!(user_id = %id, username = %account.username, "bootstrapped super admin account");
        state.users.insert(id, account);
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────

    pub fn list_roles(&self) -> InfraResult<Vec<Role>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// Active roles an administrator may hand out.
    pub fn assignable_roles(&self) -> InfraResult<Vec<RoleRef>> {
        Ok(self
            .list_roles()?
            .into_iter()
            .filter(|r| r.active && !r.is_super_admin())
            .map(|r| RoleRef { id: r.id, name: r.name })
            .collect())
    }

    pub fn get_role(&self, id: RoleId) -> InfraResult<Role> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.role(id)?.clone())
    }

    pub fn create_role(&self, name: &str, permission: PermissionMatrix) -> InfraResult<Role> {
        let role = Role::new(name, permission, &self.baseline)?;
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.ensure_role_name_free(&role.name, None)?;

        tracing::info!(role_id = %role.id, name = %role.name, "role created");
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    pub fn update_role(&self, id: RoleId, update: RoleUpdate) -> InfraResult<Role> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let mut role = state.role(id)?.clone();
        role.apply_update(update, &self.baseline)?;
        state.ensure_role_name_free(&role.name, Some(id))?;

        tracing::info!(role_id = %id, name = %role.name, "role updated");
        state.roles.insert(id, role.clone());
        Ok(role)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────

    /// Active accounts, super-role accounts hidden, ordered by creation.
    pub fn list_users(&self, request: PageRequest) -> InfraResult<Page<UserView>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut users: Vec<&UserAccount> = state
            .users
            .values()
            .filter(|u| u.is_active() && u.role_id != self.super_role)
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));

        let views = users
            .into_iter()
            .map(|u| state.view(u))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::from_items(views, request))
    }

    pub fn get_user(&self, id: UserId) -> InfraResult<UserView> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let (user, _) = state.visible_user(id)?;
        Ok(state.view(user)?)
    }

    pub async fn create_user(&self, new: NewUser) -> InfraResult<UserView> {
        {
            let state = self.state.read().map_err(|_| poisoned())?;
            ensure_assignable(state.role(new.role_id)?)?;
        }

        // Hash outside the lock.
        let account = self.new_account(&new.username, &new.password, new.role_id).await?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        ensure_assignable(state.role(account.role_id)?)?;
        state.ensure_username_free(&account.username, None)?;

        let view = state.view(&account)?;
        tracing::info!(user_id = %account.id, username = %account.username, "user created");
        state.users.insert(account.id, account);
        Ok(view)
    }

    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> InfraResult<UserView> {
        let username = update.username.as_deref().map(normalize_username).transpose()?;
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_blocking(password).await?)
            }
            None => None,
        };

        let mut state = self.state.write().map_err(|_| poisoned())?;
        let (user, _) = state.visible_user(id)?;
        let mut user = user.clone();

        if let Some(role_id) = update.role_id {
            ensure_assignable(state.role(role_id)?)?;
            user.role_id = role_id;
        }
        if let Some(username) = username {
            state.ensure_username_free(&username, Some(id))?;
            user.username = username;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }

        let view = state.view(&user)?;
        tracing::info!(user_id = %id, "user updated");
        state.users.insert(id, user);
        Ok(view)
    }

    /// Soft-delete `id` on behalf of `actor` and end its refresh session.
    pub async fn deactivate_user(&self, actor: UserId, id: UserId) -> InfraResult<()> {
        {
            let mut state = self.state.write().map_err(|_| poisoned())?;
            let user = state.users.get(&id).ok_or(DomainError::NotFound)?;
            ensure_can_deactivate(actor, user, state.role(user.role_id)?)?;

            if let Some(user) = state.users.get_mut(&id) {
                user.status = UserStatus::Deactivated;
            }
        }

        self.refresh_tokens.remove(id).await?;
        tracing::info!(user_id = %id, actor = %actor, "user deactivated");
        Ok(())
    }

    async fn new_account(&self, username: &str, password: &str, role_id: RoleId) -> InfraResult<UserAccount> {
        let username = normalize_username(username)?;
        validate_password(password)?;

        Ok(UserAccount {
            id: UserId::new(),
            username,
            password_hash: hash_blocking(password).await?,
            role_id,
            status: UserStatus::Active,
            created_at: Utc::now(),
        })
    }
}

/// Argon2 hashing on the blocking pool, like the credential check.
async fn hash_blocking(password: &str) -> InfraResult<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| StoreError::Unavailable(format!("password hashing aborted: {e}")))??;
    Ok(hash)
}

#[async_trait]
impl PermissionStore for InMemoryDirectory {
    async fn resolve_role(&self, user_id: UserId) -> Result<Option<ResolvedRole>, StoreError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let Some(user) = state.users.get(&user_id) else {
            return Ok(None);
        };
        let Some(role) = state.roles.get(&user.role_id) else {
            tracing::error!(%user_id, role_id = %user.role_id, "user references a missing role");
            return Err(StoreError::Unavailable("dangling role reference".to_string()));
        };

        Ok(Some(ResolvedRole {
            active: user.is_active() && role.active,
            role_id: role.id,
            role_name: role.name.clone(),
            permission: role.permission.clone(),
        }))
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryDirectory {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedUser>, StoreError> {
        let candidate = {
            let state = self.state.read().map_err(|_| poisoned())?;
            let username = username.trim();
            state
                .users
                .values()
                .find(|u| u.is_active() && u.username.eq_ignore_ascii_case(username))
                .cloned()
        };
        let Some(user) = candidate else {
            return Ok(None);
        };

        let password = password.to_owned();
        let hash = user.password_hash.clone();
        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| StoreError::Unavailable(format!("credential check aborted: {e}")))?
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "stored credential is unreadable");
                StoreError::Unavailable("stored credential is unreadable".to_string())
            })?;

        Ok(matched.then(|| VerifiedUser {
            user_id: user.id,
            username: user.username,
            role_id: user.role_id,
        }))
    }
}
