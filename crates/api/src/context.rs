use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Caller identity attached to requests that passed a guard.
pub use workdesk_auth::AuthContext;

/// Raw `Authorization` header value, owned so it can outlive the request
/// borrow across the store round trip.
///
/// A value that is not visible ASCII is passed on as empty, which the gate
/// classifies as malformed.
pub fn authorization_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned())
}
