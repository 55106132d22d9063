use std::sync::Arc;

use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};

use workdesk_auth::{AuthGate, AuthorizationExplanation, LoginOutcome, TokenPair, explain_authorization};

use crate::app::dto::{self, ApiJson, ApiQuery, MeResponse, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthContext, authorization_header};
use crate::middleware::guarded;

pub fn router(gate: &Arc<AuthGate>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", guarded(get(me), gate, None))
        .route("/explain", guarded(get(explain), gate, None))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let outcome = services.session.login(&body.username, &body.password).await?;
    Ok(Json(outcome))
}

/// The refresh token travels as the bearer credential.
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, ApiError> {
    let header = authorization_header(&headers);
    let pair = services.session.refresh(header.as_deref()).await?;
    Ok(Json(pair))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.session.logout(body.user_id).await?;
    Ok(Json(dto::SUCCESS))
}

pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeResponse> {
    Json(ctx.into())
}

pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<dto::ExplainQuery>,
) -> Result<Json<AuthorizationExplanation>, ApiError> {
    let requirement = services.gate.requirement(&query.group, &query.action)?;
    Ok(Json(explain_authorization(
        &ctx.role_name,
        &ctx.overrides,
        &services.baseline,
        &requirement,
    )))
}
