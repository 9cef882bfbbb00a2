//! JSON REST handlers for groups.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use sitehub_app::ports::{GroupRepository, SiteRepository};
use sitehub_domain::group::{Group, GroupDraft, GroupPatch};
use sitehub_domain::id::GroupId;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string accepted by the list endpoint. Other keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name: Option<String>,
    #[serde(rename = "type", alias = "group_type")]
    pub group_type: Option<String>,
    pub sort: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Group>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum GetResponse {
    Ok(Json<Group>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Group>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/groups`
pub async fn list<G, S>(
    State(state): State<AppState<G, S>>,
    Query(params): Query<ListParams>,
) -> Result<ListResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let filters = [
        ("name", params.name.as_deref()),
        ("type", params.group_type.as_deref()),
    ];
    let groups = state
        .group_service
        .list_groups(&filters, params.sort.as_deref())
        .await?;
    Ok(ListResponse::Ok(Json(groups)))
}

/// `GET /api/groups/{id}`
pub async fn get<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let group_id: GroupId = parse_id(&id)?;
    let group = state.group_service.get_group(group_id).await?;
    Ok(GetResponse::Ok(Json(group)))
}

/// `POST /api/groups`
pub async fn create<G, S>(
    State(state): State<AppState<G, S>>,
    payload: Result<Json<GroupDraft>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let Json(draft) = payload?;
    let created = state.group_service.create_group(draft).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/groups/{id}`
pub async fn update<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
    payload: Result<Json<GroupPatch>, JsonRejection>,
) -> Result<GetResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let group_id: GroupId = parse_id(&id)?;
    let Json(patch) = payload?;
    let updated = state.group_service.update_group(group_id, patch).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/groups/{id}`
pub async fn delete<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let group_id: GroupId = parse_id(&id)?;
    state.group_service.delete_group(group_id).await?;
    Ok(DeleteResponse::NoContent)
}
