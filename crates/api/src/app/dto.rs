use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use workdesk_auth::{AuthContext, BaselineTemplate, PermissionMatrix, Role};
use workdesk_core::{PageRequest, RoleId, UserId};

use crate::app::errors::ApiError;

// -------------------------
// Extractors
// -------------------------

/// `axum::Json` whose rejection uses the API error shape.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

/// `axum::extract::Query` whose rejection uses the API error shape.
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(rename = "userID")]
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub group: String,
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permission: PermissionMatrix,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub const SUCCESS: MessageResponse = MessageResponse { message: "success" };

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub user_type: RoleSummary,
    pub permission: PermissionMatrix,
}

impl From<AuthContext> for MeResponse {
    fn from(ctx: AuthContext) -> Self {
        Self {
            user_id: ctx.user_id,
            user_type: RoleSummary {
                id: ctx.role_id,
                name: ctx.role_name,
                active: true,
            },
            permission: ctx.permission,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    #[serde(rename = "userTypeID")]
    pub id: RoleId,
    pub name: String,
    pub active: bool,
}

impl From<Role> for RoleSummary {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            active: role.active,
        }
    }
}

/// A role with its stored overrides, the merged result and the baseline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetail {
    #[serde(rename = "userTypeID")]
    pub id: RoleId,
    pub name: String,
    pub active: bool,
    pub permission: PermissionMatrix,
    pub effective_permission: PermissionMatrix,
    pub pre_permission: PermissionMatrix,
}

impl RoleDetail {
    pub fn new(role: Role, baseline: &BaselineTemplate) -> Result<Self, ApiError> {
        let effective_permission = role.effective_permission(baseline)?;
        Ok(Self {
            id: role.id,
            name: role.name,
            active: role.active,
            permission: role.permission,
            effective_permission,
            pre_permission: baseline.matrix().clone(),
        })
    }
}
