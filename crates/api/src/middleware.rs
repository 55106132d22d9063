use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;

use workdesk_auth::{AuthGate, Requirement};

use crate::app::errors::ApiError;
use crate::context::authorization_header;

/// Route guard state: the gate plus what the route demands.
///
/// `requirement: None` only requires an authenticated caller.
#[derive(Clone)]
pub struct Guard {
    pub gate: Arc<AuthGate>,
    pub requirement: Option<Arc<Requirement>>,
}

pub async fn guard_middleware(State(guard): State<Guard>, mut req: Request, next: Next) -> Response {
    let header = authorization_header(req.headers());

    let result = match guard.requirement.as_deref() {
        Some(requirement) => guard.gate.authorize(header.as_deref(), requirement).await,
        None => guard.gate.authenticate(header.as_deref()).await,
    };

    match result {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Protect `route` with the gate.
pub fn guarded<S>(route: MethodRouter<S>, gate: &Arc<AuthGate>, requirement: Option<Requirement>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let guard = Guard {
        gate: gate.clone(),
        requirement: requirement.map(Arc::new),
    };
    route.route_layer(from_fn_with_state(guard, guard_middleware))
}
