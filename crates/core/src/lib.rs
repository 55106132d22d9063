//! `workdesk-core` — shared domain building blocks.
//!
//! Identifiers, the domain error model and pagination primitives. No IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod pagination;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{RecordId, RoleId, UserId};
pub use pagination::{Page, PageMarker, PageRequest};
