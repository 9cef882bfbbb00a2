//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use sitehub_domain::error::SiteHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Every failure an endpoint can answer with, rendered as an [`ErrorBody`].
#[derive(Debug)]
pub enum ApiError {
    Domain(SiteHubError),
    /// The request body was not acceptable JSON. Keeps axum's status code.
    Body(JsonRejection),
}

impl From<SiteHubError> for ApiError {
    fn from(err: SiteHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            Self::Domain(err) => err,
            Self::Body(rejection) => {
                let body = ErrorBody {
                    error: rejection.body_text(),
                };
                return (rejection.status(), Json(body)).into_response();
            }
        };
        let (status, message) = match &err {
            SiteHubError::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            SiteHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            SiteHubError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            SiteHubError::Unsupported(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SiteHubError::Storage(err) => {
                tracing::error!(error = ?err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
