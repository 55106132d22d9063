//! `workdesk-auth` — authentication and permission evaluation.
//!
//! Decoupled from HTTP and from any concrete storage: stores are reached
//! through the traits in [`store`], and every failure leaves the crate as an
//! [`AuthError`].

pub mod authorize;
pub mod claims;
pub mod config;
pub mod error;
pub mod gate;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod store;
pub mod token;
pub mod user;

pub use authorize::{AuthorizationExplanation, DecisionSource, Requirement, authorize, explain_authorization};
pub use claims::{AccessClaims, RefreshClaims, RoleClaim, TokenKind};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, StoreError, Unauthenticated};
pub use gate::{AuthContext, AuthGate, extract_bearer};
pub use password::{PasswordError, hash_password, verify_password};
pub use permissions::{BaselineTemplate, PermissionError, PermissionKey, PermissionMatrix};
pub use roles::{Role, RoleUpdate, SUPER_ADMIN, effective_permission, is_reserved_name, is_super_admin};
pub use session::{AuthSession, LoginOutcome, ProfileRole, TokenPair, UserProfile};
pub use store::{CredentialVerifier, PermissionStore, RefreshTokenStore, ResolvedRole, VerifiedUser, bounded};
pub use token::{TokenError, TokenService};
pub use user::{
    NewUser, UserAccount, UserStatus, UserUpdate, ensure_assignable, ensure_can_deactivate, normalize_username,
    validate_password,
};
