//! `workdesk-infra` — store adapters behind the auth and record traits.
//!
//! Everything here is in-memory; a database-backed adapter implements the
//! same `workdesk-auth` store traits.

pub mod directory;
pub mod error;
pub mod records;
pub mod refresh_store;

pub use directory::{InMemoryDirectory, RoleRef, UserView};
pub use error::{InfraError, InfraResult};
pub use records::{InMemoryRecordStore, RecordBook, Shelved};
pub use refresh_store::InMemoryRefreshTokenStore;
