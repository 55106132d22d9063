//! CRUD routes shared by every record type, guarded by the record's
//! permission group.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use workdesk_auth::{AuthGate, PermissionError};
use workdesk_core::{Page, RecordId};
use workdesk_infra::Shelved;

use crate::app::dto::{ApiJson, ApiQuery, DataResponse, MessageResponse, PageQuery, SUCCESS};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::guarded;

pub fn router<R: Shelved>(gate: &Arc<AuthGate>) -> Result<Router, PermissionError> {
    let group = R::KIND.group();
    let view = gate.requirement(group, "view")?;
    let add = gate.requirement(group, "add")?;
    let edit = gate.requirement(group, "edit")?;
    let delete = gate.requirement(group, "delete")?;

    Ok(Router::new()
        .route("/", guarded(get(list::<R>), gate, Some(view.clone())))
        .route("/", guarded(axum::routing::post(create::<R>), gate, Some(add)))
        .route("/:id", guarded(get(fetch::<R>), gate, Some(view)))
        .route("/:id", guarded(axum::routing::patch(update::<R>), gate, Some(edit)))
        .route("/:id", guarded(axum::routing::delete(remove::<R>), gate, Some(delete))))
}

pub(crate) fn parse_id(raw: &str) -> Result<RecordId, ApiError> {
    Ok(raw.parse::<RecordId>()?)
}

async fn list<R: Shelved>(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<R>>, ApiError> {
    Ok(Json(services.records.list::<R>(query.request())?))
}

async fn fetch<R: Shelved>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<R>>, ApiError> {
    let data = services.records.get::<R>(parse_id(&id)?)?;
    Ok(Json(DataResponse { data }))
}

async fn create<R: Shelved>(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(draft): ApiJson<R::Draft>,
) -> Result<(StatusCode, Json<DataResponse<R>>), ApiError> {
    let data = services.records.create::<R>(draft)?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

async fn update<R: Shelved>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<R::Patch>,
) -> Result<Json<DataResponse<R>>, ApiError> {
    let data = services.records.update::<R>(parse_id(&id)?, patch)?;
    Ok(Json(DataResponse { data }))
}

async fn remove<R: Shelved>(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.records.delete::<R>(parse_id(&id)?)?;
    Ok(Json(SUCCESS))
}
