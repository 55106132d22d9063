use serde::{Deserialize, Serialize};

use workdesk_core::{DomainError, RoleId};

use crate::permissions::{BaselineTemplate, PermissionError, PermissionMatrix};

/// Reserved role name that bypasses matrix evaluation.
pub const SUPER_ADMIN: &str = "SuperAdmin";

/// Whether `name` is the super-role (exact match, the form authorization uses).
pub fn is_super_admin(name: &str) -> bool {
    name == SUPER_ADMIN
}

/// Whether `name` would collide with the super-role.
///
/// Stricter than [`is_super_admin`]: case and surrounding whitespace are
/// ignored so look-alike names cannot be created.
pub fn is_reserved_name(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(SUPER_ADMIN)
}

/// Effective matrix for a role: everything for the super-role, otherwise the
/// baseline merged with the role's overrides.
pub fn effective_permission(
    role_name: &str,
    overrides: &PermissionMatrix,
    baseline: &BaselineTemplate,
) -> Result<PermissionMatrix, PermissionError> {
    if is_super_admin(role_name) {
        Ok(baseline.grant_all())
    } else {
        baseline.effective(overrides)
    }
}

/// A role (user type) with its stored permission overrides.
///
/// # Invariants
/// - Only [`Role::super_admin`] produces a role named `SuperAdmin`.
/// - The super-role is immutable and its matrix is never consulted.
/// - Overrides of any other role only name pairs known to the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permission: PermissionMatrix,
    pub active: bool,
}

/// Partial role update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub permission: Option<PermissionMatrix>,
}

impl Role {
    pub fn new(
        name: &str,
        permission: PermissionMatrix,
        baseline: &BaselineTemplate,
    ) -> Result<Self, DomainError> {
        let name = validate_name(name)?;
        baseline
            .validate(&permission)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        Ok(Self {
            id: RoleId::new(),
            name,
            permission,
            active: true,
        })
    }

    /// The one super-role. Callers are responsible for creating it once.
    pub fn super_admin() -> Self {
        Self {
            id: RoleId::new(),
            name: SUPER_ADMIN.to_string(),
            permission: PermissionMatrix::new(),
            active: true,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        is_super_admin(&self.name)
    }

    pub fn effective_permission(
        &self,
        baseline: &BaselineTemplate,
    ) -> Result<PermissionMatrix, PermissionError> {
        effective_permission(&self.name, &self.permission, baseline)
    }

    /// Apply `update`, validating it fully before mutating anything.
    pub fn apply_update(
        &mut self,
        update: RoleUpdate,
        baseline: &BaselineTemplate,
    ) -> Result<(), DomainError> {
        if self.is_super_admin() {
            return Err(DomainError::invariant("Can't modify the Super admin role"));
        }

        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(permission) = &update.permission {
            baseline
                .validate(permission)
                .map_err(|e| DomainError::validation(e.to_string()))?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(permission) = update.permission {
            self.permission = permission;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("role name cannot be empty"));
    }
    if is_reserved_name(name) {
        return Err(DomainError::invariant(format!(
            "role name '{SUPER_ADMIN}' is reserved"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_super_role_cannot_take_reserved_name() {
        let baseline = BaselineTemplate::default();
        for name in ["SuperAdmin", "superadmin", "  SUPERADMIN "] {
            let err = Role::new(name, PermissionMatrix::new(), &baseline).unwrap_err();
            assert!(matches!(err, DomainError::InvariantViolation(_)), "{name}");
        }
    }

    #[test]
    fn rename_to_reserved_name_fails_and_leaves_role_untouched() {
        let baseline = BaselineTemplate::default();
        let mut role = Role::new("Editor", PermissionMatrix::new(), &baseline).unwrap();

        let result = role.apply_update(
            RoleUpdate {
                name: Some("SuperAdmin".into()),
                permission: Some(PermissionMatrix::new().with("customers", "view", true)),
            },
            &baseline,
        );

        assert!(result.is_err());
        assert_eq!(role.name, "Editor");
        assert!(role.permission.is_empty());
    }

    #[test]
    fn super_role_is_immutable() {
        let baseline = BaselineTemplate::default();
        let mut role = Role::super_admin();
        let result = role.apply_update(
            RoleUpdate {
                name: Some("Admin".into()),
                permission: None,
            },
            &baseline,
        );
        assert!(result.is_err());
        assert!(role.is_super_admin());
    }

    #[test]
    fn unknown_override_is_rejected_at_creation() {
        let baseline = BaselineTemplate::default();
        let overrides = PermissionMatrix::new().with("customers", "export", true);
        let err = Role::new("Clerk", overrides, &baseline).unwrap_err();
        assert!(err.to_string().contains("customers.export"));
    }

    #[test]
    fn super_role_effective_matrix_grants_everything() {
        let baseline = BaselineTemplate::default();
        let effective = Role::super_admin().effective_permission(&baseline).unwrap();
        assert_eq!(effective, baseline.grant_all());
    }
}
