//! `workdesk-records` — business records guarded by the permission matrix.
//!
//! Pure models: validation and update rules only. Storage lives in
//! `workdesk-infra`, routing in `workdesk-api`.

pub mod customer;
pub mod expense;
pub mod project;

pub use customer::{Customer, CustomerUpdate, NewCustomer};
pub use expense::{Expense, ExpenseLine, ExpenseUpdate, NewExpense};
pub use project::{NewProject, Project, ProjectUpdate};

use serde::Serialize;
use serde::de::DeserializeOwned;

use workdesk_core::{DomainResult, Entity, RecordId};

/// Kind of record, doubling as its permission group name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Customer,
    Project,
    Expense,
}

impl RecordKind {
    pub fn group(&self) -> &'static str {
        match self {
            RecordKind::Customer => "customers",
            RecordKind::Project => "projects",
            RecordKind::Expense => "expenses",
        }
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.group())
    }
}

/// A soft-deletable business record with create and partial-update inputs.
pub trait Record: Entity<Id = RecordId> + Clone + Serialize + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Creation payload.
    type Draft: DeserializeOwned + Send + 'static;

    /// Partial-update payload; absent fields are left untouched.
    type Patch: DeserializeOwned + Send + 'static;

    fn create(draft: Self::Draft) -> DomainResult<Self>;

    /// Apply `patch`, validating it fully before mutating anything.
    fn apply(&mut self, patch: Self::Patch) -> DomainResult<()>;

    /// Other records this one points at; each must exist and be active.
    fn links(&self) -> Vec<(RecordKind, RecordId)> {
        Vec::new()
    }

    /// Ordering key for list endpoints (newest first).
    fn sort_key(&self) -> chrono::DateTime<chrono::Utc>;
}

pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(workdesk_core::DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(value.to_string())
}
