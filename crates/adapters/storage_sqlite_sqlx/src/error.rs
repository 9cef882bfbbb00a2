//! Storage-specific error type wrapping sqlx errors.

use chrono::NaiveDate;
use sitehub_domain::error::{ConflictError, SiteHubError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Database(sqlx::Error::Database(err)) if err.is_unique_violation())
    }

    /// Turn a write failure on `sites` into a domain error.
    ///
    /// The only unique constraint a site write can break beside its primary
    /// key is the French installation date index.
    pub(crate) fn into_site_write_error(self, date: NaiveDate) -> SiteHubError {
        if self.is_unique_violation() {
            tracing::debug!(%date, "french installation date index rejected write");
            ConflictError::FrenchInstallationDateTaken { date }.into()
        } else {
            self.into()
        }
    }
}

impl From<StorageError> for SiteHubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Decode a column value through its [`FromStr`](std::str::FromStr) impl.
pub(crate) fn decode<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}
