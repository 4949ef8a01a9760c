//! Conversions from external infrastructure errors into domain errors.

use qdmsync_domain::QdmSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub QdmSyncError);

impl From<InfraError> for QdmSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<QdmSyncError> for InfraError {
    fn from(value: QdmSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoQdmSyncError {
    fn into_domain(self) -> QdmSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → QdmSyncError */
/* -------------------------------------------------------------------------- */

impl IntoQdmSyncError for SqlError {
    fn into_domain(self) -> QdmSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => QdmSyncError::Persistence("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        QdmSyncError::Persistence("database is locked".into())
                    }
                    ErrorCode::DiskFull => QdmSyncError::Persistence("disk is full".into()),
                    ErrorCode::ReadOnly => {
                        QdmSyncError::Persistence("database is read-only".into())
                    }
                    ErrorCode::CannotOpen => {
                        QdmSyncError::Persistence(format!("unable to open database: {message}"))
                    }
                    _ => QdmSyncError::Persistence(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::InvalidPath(path) => QdmSyncError::Persistence(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => QdmSyncError::Persistence("invalid SQL query".into()),
            other => QdmSyncError::Persistence(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → QdmSyncError */
/* -------------------------------------------------------------------------- */

impl IntoQdmSyncError for r2d2::Error {
    fn into_domain(self) -> QdmSyncError {
        QdmSyncError::Persistence(format!("connection pool error: {self}"))
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → QdmSyncError */
/* -------------------------------------------------------------------------- */

impl IntoQdmSyncError for HttpError {
    fn into_domain(self) -> QdmSyncError {
        if self.is_timeout() {
            return QdmSyncError::Transport(format!("http request timed out: {self}"));
        }
        if self.is_connect() {
            return QdmSyncError::Transport(format!("http connection failed: {self}"));
        }
        if self.is_decode() {
            return QdmSyncError::RemoteApi(format!("http response could not be decoded: {self}"));
        }
        if self.is_builder() {
            return QdmSyncError::Config(format!("invalid http request: {self}"));
        }
        QdmSyncError::Transport(format!("http error: {self}"))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_domain())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → QdmSyncError */
/* -------------------------------------------------------------------------- */

impl IntoQdmSyncError for serde_json::Error {
    fn into_domain(self) -> QdmSyncError {
        QdmSyncError::RemoteApi(format!("malformed response payload: {self}"))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(value.into_domain())
    }
}
