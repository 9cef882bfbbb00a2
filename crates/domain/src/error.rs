//! Common error types used across the workspace.
//!
//! Each layer raises a typed error and converts it into [`SiteHubError`]
//! through `#[from]`, so callers can match on the failure category without
//! parsing messages.

use std::fmt;

use chrono::NaiveDate;

/// Top-level error returned by domain, application, and storage code.
#[derive(Debug, thiserror::Error)]
pub enum SiteHubError {
    /// The input is malformed, missing, or contradictory.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced record does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A business rule rejected the operation.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// A discriminator value is not supported.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedValueError),

    /// The store failed; the inner error is adapter specific.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Input shape violations, raised before any business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("country must not be empty")]
    EmptyCountry,

    #[error("field '{0}' is required")]
    MissingField(&'static str),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("Field '{field}' is required when country is '{country}'")]
    MissingCountryField {
        field: &'static str,
        country: &'static str,
    },

    #[error("Field '{field}' is not allowed when country is '{country}'")]
    ForbiddenCountryField {
        field: &'static str,
        country: &'static str,
    },
}

/// A lookup by id did not resolve.
///
/// `id` holds every missing identifier, comma separated, when several ids were
/// requested at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    #[must_use]
    pub fn one(entity: &'static str, id: impl fmt::Display) -> Self {
        Self {
            entity,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn many<T: fmt::Display>(entity: &'static str, ids: &[T]) -> Self {
        Self {
            entity,
            id: ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Business-rule violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictError {
    #[error("Only one French site can be installed per day.")]
    FrenchInstallationDateTaken { date: NaiveDate },

    #[error("Italian sites must be installed on weekends.")]
    ItalianInstallationOnWeekday { date: NaiveDate },

    #[error("Group {id} is of type group3 — not allowed.")]
    GroupTypeNotAllowed { id: String },

    #[error("Cannot delete group linked to sites.")]
    GroupLinkedToSites { id: String },
}

/// A string discriminator outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported {kind}: {value}")]
pub struct UnsupportedValueError {
    pub kind: &'static str,
    pub value: String,
}
