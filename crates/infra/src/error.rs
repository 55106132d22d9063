use thiserror::Error;

use workdesk_auth::{PasswordError, StoreError};
use workdesk_core::DomainError;

/// Failure of an administration or record operation against the stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfraError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

pub type InfraResult<T> = Result<T, InfraError>;

pub(crate) fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}
