//! Role administration. Every route here is reserved to the super-role.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use workdesk_auth::{AuthGate, Requirement, RoleUpdate};
use workdesk_core::RoleId;

use crate::app::dto::{ApiJson, CreateRoleRequest, DataResponse, RoleDetail, RoleSummary};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::guarded;

pub fn router(gate: &Arc<AuthGate>) -> Router {
    let super_only = || Some(Requirement::SuperAdmin);

    Router::new()
        .route("/", guarded(get(list_roles), gate, super_only()))
        .route("/", guarded(post(create_role), gate, super_only()))
        .route("/:id", guarded(get(get_role), gate, super_only()))
        .route("/:id", guarded(patch(update_role), gate, super_only()))
}

fn parse_role_id(raw: &str) -> Result<RoleId, ApiError> {
    Ok(raw.parse::<RoleId>()?)
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<DataResponse<Vec<RoleSummary>>>, ApiError> {
    let data = services
        .directory
        .list_roles()?
        .into_iter()
        .map(RoleSummary::from)
        .collect();
    Ok(Json(DataResponse { data }))
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<RoleDetail>>, ApiError> {
    let role = services.directory.get_role(parse_role_id(&id)?)?;
    let data = RoleDetail::new(role, &services.baseline)?;
    Ok(Json(DataResponse { data }))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, Json<DataResponse<RoleDetail>>), ApiError> {
    let role = services.directory.create_role(&body.name, body.permission)?;
    let data = RoleDetail::new(role, &services.baseline)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<RoleUpdate>,
) -> Result<Json<DataResponse<RoleDetail>>, ApiError> {
    let role = services.directory.update_role(parse_role_id(&id)?, body)?;
    let data = RoleDetail::new(role, &services.baseline)?;
    Ok(Json(DataResponse { data }))
}
