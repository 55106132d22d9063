use std::sync::Arc;

use axum::Router;

use workdesk_auth::{AuthGate, PermissionError};
use workdesk_records::{Customer, Expense, Project};

pub mod auth;
pub mod records;
pub mod roles;
pub mod system;
pub mod users;

/// Router for everything under the auth layer. Requirements are checked
/// against the baseline template here, so a route naming an unknown
/// permission fails at startup instead of denying every request.
pub fn router(gate: &Arc<AuthGate>) -> Result<Router, PermissionError> {
    Ok(Router::new()
        .nest("/auth", auth::router(gate))
        .nest("/customers", records::router::<Customer>(gate)?)
        .nest("/projects", records::router::<Project>(gate)?)
        .nest("/expenses", records::router::<Expense>(gate)?)
        .nest("/users", users::router(gate)?)
        .nest("/roles", roles::router(gate)))
}
