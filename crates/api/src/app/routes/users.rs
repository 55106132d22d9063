use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};

use workdesk_auth::{AuthGate, NewUser, PermissionError, UserUpdate};
use workdesk_core::{Page, UserId};
use workdesk_infra::{RoleRef, UserView};

use crate::app::dto::{ApiJson, ApiQuery, DataResponse, MessageResponse, PageQuery, SUCCESS};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::AuthContext;
use crate::middleware::guarded;

pub fn router(gate: &Arc<AuthGate>) -> Result<Router, PermissionError> {
    let view = gate.requirement("users", "view")?;
    let add = gate.requirement("users", "add")?;
    let edit = gate.requirement("users", "edit")?;
    let remove = gate.requirement("users", "delete")?;

    Ok(Router::new()
        .route("/", guarded(get(list_users), gate, Some(view.clone())))
        .route("/", guarded(post(create_user), gate, Some(add)))
        .route("/roles", guarded(get(assignable_roles), gate, Some(view.clone())))
        .route("/:id", guarded(get(get_user), gate, Some(view)))
        .route("/:id", guarded(patch(update_user), gate, Some(edit)))
        .route("/:id", guarded(delete(delete_user), gate, Some(remove))))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(raw.parse::<UserId>()?)
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<UserView>>, ApiError> {
    Ok(Json(services.directory.list_users(query.request())?))
}

pub async fn assignable_roles(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<DataResponse<Vec<RoleRef>>>, ApiError> {
    let data = services.directory.assignable_roles()?;
    Ok(Json(DataResponse { data }))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<UserView>>, ApiError> {
    let data = services.directory.get_user(parse_user_id(&id)?)?;
    Ok(Json(DataResponse { data }))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<DataResponse<UserView>>), ApiError> {
    let data = services.directory.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Json<DataResponse<UserView>>, ApiError> {
    let data = services.directory.update_user(parse_user_id(&id)?, body).await?;
    Ok(Json(DataResponse { data }))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services
        .directory
        .deactivate_user(ctx.user_id, parse_user_id(&id)?)
        .await?;
    Ok(Json(SUCCESS))
}
