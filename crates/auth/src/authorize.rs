use serde::Serialize;

use crate::error::AuthError;
use crate::permissions::{BaselineTemplate, PermissionKey, PermissionMatrix};
use crate::roles::{SUPER_ADMIN, is_super_admin};

/// What a route demands of its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A `(group, action)` pair of the effective matrix.
    Permission(PermissionKey),
    /// Only the super-role may pass.
    SuperAdmin,
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Permission(key) => core::fmt::Display::fmt(key, f),
            Requirement::SuperAdmin => f.write_str(SUPER_ADMIN),
        }
    }
}

/// Decide a requirement for an already-resolved role.
///
/// - No IO
/// - No panics
/// - The super-role passes unconditionally; its matrix is not looked at.
pub fn authorize(
    role_name: &str,
    effective: &PermissionMatrix,
    requirement: &Requirement,
) -> Result<(), AuthError> {
    if is_super_admin(role_name) {
        return Ok(());
    }

    match requirement {
        Requirement::SuperAdmin => Err(AuthError::Forbidden(requirement.to_string())),
        Requirement::Permission(key) if effective.allows(key) => Ok(()),
        Requirement::Permission(key) => Err(AuthError::Forbidden(key.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Where the deciding value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// Caller holds the super-role.
    SuperRole,
    /// The role stores an explicit value for the pair.
    RoleOverride,
    /// The pair is inherited from the baseline template.
    Baseline,
    /// The requirement is super-role only.
    SuperRoleRequired,
}

/// Why a requirement would be granted or denied for a role.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required: String,
    pub granted: bool,
    pub source: DecisionSource,
    pub reason: String,
}

/// Explain the decision [`authorize`] makes, distinguishing inherited
/// defaults from explicit overrides.
pub fn explain_authorization(
    role_name: &str,
    overrides: &PermissionMatrix,
    baseline: &BaselineTemplate,
    requirement: &Requirement,
) -> AuthorizationExplanation {
    let required = requirement.to_string();

    if is_super_admin(role_name) {
        return AuthorizationExplanation {
            required,
            granted: true,
            source: DecisionSource::SuperRole,
            reason: format!("role '{role_name}' bypasses permission evaluation"),
        };
    }

    let key = match requirement {
        Requirement::SuperAdmin => {
            return AuthorizationExplanation {
                required,
                granted: false,
                source: DecisionSource::SuperRoleRequired,
                reason: format!("only the '{SUPER_ADMIN}' role may perform this operation"),
            };
        }
        Requirement::Permission(key) => key,
    };

    match overrides.get(key.group(), key.action()) {
        Some(granted) => AuthorizationExplanation {
            required,
            granted,
            source: DecisionSource::RoleOverride,
            reason: format!(
                "role '{role_name}' explicitly {} '{key}'",
                if granted { "grants" } else { "denies" }
            ),
        },
        None => {
            let granted = baseline.matrix().allows(key);
            AuthorizationExplanation {
                required,
                granted,
                source: DecisionSource::Baseline,
                reason: format!(
                    "role '{role_name}' has no override for '{key}'; baseline default is {granted}"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> BaselineTemplate {
        BaselineTemplate::new(
            PermissionMatrix::new()
                .with("documents", "write", false)
                .with("documents", "read", true),
        )
        .unwrap()
    }

    #[test]
    fn super_role_passes_every_requirement() {
        let baseline = baseline();
        let empty = PermissionMatrix::new();
        let write = Requirement::Permission(baseline.key("documents", "write").unwrap());

        assert!(authorize(SUPER_ADMIN, &empty, &write).is_ok());
        assert!(authorize(SUPER_ADMIN, &empty, &Requirement::SuperAdmin).is_ok());
    }

    #[test]
    fn super_only_requirement_rejects_other_roles() {
        let effective = baseline().grant_all();
        let err = authorize("Editor", &effective, &Requirement::SuperAdmin).unwrap_err();
        assert_eq!(err, AuthError::Forbidden(SUPER_ADMIN.to_string()));
    }

    #[test]
    fn matrix_decides_for_regular_roles() {
        let baseline = baseline();
        let effective = baseline
            .effective(&PermissionMatrix::new().with("documents", "write", true))
            .unwrap();
        let write = Requirement::Permission(baseline.key("documents", "write").unwrap());
        assert!(authorize("Editor", &effective, &write).is_ok());

        let effective = baseline.effective(&PermissionMatrix::new()).unwrap();
        assert_eq!(
            authorize("Viewer", &effective, &write),
            Err(AuthError::Forbidden("documents.write".to_string()))
        );
    }

    #[test]
    fn explanation_distinguishes_override_from_baseline() {
        let baseline = baseline();
        let overrides = PermissionMatrix::new().with("documents", "write", true);

        let write = Requirement::Permission(baseline.key("documents", "write").unwrap());
        let read = Requirement::Permission(baseline.key("documents", "read").unwrap());

        let explained = explain_authorization("Editor", &overrides, &baseline, &write);
        assert!(explained.granted);
        assert_eq!(explained.source, DecisionSource::RoleOverride);

        let explained = explain_authorization("Editor", &overrides, &baseline, &read);
        assert!(explained.granted);
        assert_eq!(explained.source, DecisionSource::Baseline);
    }
}
