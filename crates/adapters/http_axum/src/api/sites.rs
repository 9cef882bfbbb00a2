//! JSON REST handlers for sites.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use sitehub_app::ports::{GroupRepository, SiteRepository};
use sitehub_domain::id::SiteId;
use sitehub_domain::site::{Site, SiteDraft, SitePatch};

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string accepted by the list endpoint. Other keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name: Option<String>,
    pub country: Option<String>,
    pub installation_date: Option<String>,
    pub sort: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Site>>),
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
    Ok(Json<Site>),
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
    Created(Json<Site>),
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

/// `GET /api/sites`
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
        ("country", params.country.as_deref()),
        ("installation_date", params.installation_date.as_deref()),
    ];
    let sites = state
        .site_service
        .list_sites(&filters, params.sort.as_deref())
        .await?;
    Ok(ListResponse::Ok(Json(sites)))
}

/// `GET /api/sites/{id}`
pub async fn get<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let site_id: SiteId = parse_id(&id)?;
    let site = state.site_service.get_site(site_id).await?;
    Ok(GetResponse::Ok(Json(site)))
}

/// `POST /api/sites`
pub async fn create<G, S>(
    State(state): State<AppState<G, S>>,
    payload: Result<Json<SiteDraft>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let Json(draft) = payload?;
    let created = state.site_service.create_site(draft).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/sites/{id}`
pub async fn update<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
    payload: Result<Json<SitePatch>, JsonRejection>,
) -> Result<GetResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let site_id: SiteId = parse_id(&id)?;
    let Json(patch) = payload?;
    let updated = state.site_service.update_site(site_id, patch).await?;
    Ok(GetResponse::Ok(Json(updated)))
}

/// `DELETE /api/sites/{id}`
pub async fn delete<G, S>(
    State(state): State<AppState<G, S>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    let site_id: SiteId = parse_id(&id)?;
    state.site_service.delete_site(site_id).await?;
    Ok(DeleteResponse::NoContent)
}
