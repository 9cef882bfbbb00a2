//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod groups;
#[allow(clippy::missing_errors_doc)]
pub mod sites;

use std::str::FromStr;

use axum::Router;
use axum::routing::get;

use sitehub_app::ports::{GroupRepository, SiteRepository};
use sitehub_domain::error::{SiteHubError, ValidationError};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<G, S>() -> Router<AppState<G, S>>
where
    G: GroupRepository + Send + Sync + 'static,
    S: SiteRepository + Send + Sync + 'static,
{
    Router::new()
        // Groups
        .route(
            "/groups",
            get(groups::list::<G, S>).post(groups::create::<G, S>),
        )
        .route(
            "/groups/{id}",
            get(groups::get::<G, S>)
                .patch(groups::update::<G, S>)
                .delete(groups::delete::<G, S>),
        )
        // Sites
        .route("/sites", get(sites::list::<G, S>).post(sites::create::<G, S>))
        .route(
            "/sites/{id}",
            get(sites::get::<G, S>)
                .patch(sites::update::<G, S>)
                .delete(sites::delete::<G, S>),
        )
}

/// Parse a path segment into a typed id.
fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = ValidationError>,
{
    raw.parse::<T>()
        .map_err(|err| ApiError::from(SiteHubError::from(err)))
}
