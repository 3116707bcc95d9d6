use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Classified backend rejection cause, present only when the storage
    /// backend refused a write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<RejectionCause>,
}

/// Why the storage backend refused a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCause {
    /// The rides table does not exist
    MissingTable,
    /// Credentials rejected or insufficient privileges
    PermissionDenied,
    /// A NOT NULL column received no value
    MissingField,
    /// The row referenced a column the table does not have
    UnknownColumn,
    Other,
}

impl std::fmt::Display for RejectionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RejectionCause::MissingTable => "missing table",
            RejectionCause::PermissionDenied => "permission denied",
            RejectionCause::MissingField => "missing required field",
            RejectionCause::UnknownColumn => "unknown column",
            RejectionCause::Other => "rejected",
        };
        f.write_str(label)
    }
}

impl RejectionCause {
    /// Classify a Postgres rejection from its SQLSTATE code, falling back to
    /// the message text when the code is absent or unrecognised.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        match code {
            Some("42P01") => return RejectionCause::MissingTable,
            Some("42501") | Some("28000") | Some("28P01") => {
                return RejectionCause::PermissionDenied
            }
            Some("23502") => return RejectionCause::MissingField,
            Some("42703") => return RejectionCause::UnknownColumn,
            _ => {}
        }

        let msg = message.to_lowercase();
        if msg.contains("column") && msg.contains("does not exist") {
            RejectionCause::UnknownColumn
        } else if msg.contains("relation") && msg.contains("does not exist") {
            RejectionCause::MissingTable
        } else if msg.contains("permission denied")
            || msg.contains("unauthorized")
            || msg.contains("401")
        {
            RejectionCause::PermissionDenied
        } else if msg.contains("null value") || msg.contains("not null") {
            RejectionCause::MissingField
        } else {
            RejectionCause::Other
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Storage backend rejected the write ({cause}): {message}")]
    BackendRejected {
        cause: RejectionCause,
        message: String,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, cause) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BackendUnavailable(msg) => {
                tracing::error!("Storage backend unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone(), None)
            }
            AppError::BackendRejected { cause, message } => {
                tracing::error!("Storage backend rejected write ({}): {}", cause, message);
                (StatusCode::BAD_GATEWAY, message.clone(), Some(*cause))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None)
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: message,
                cause,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let cause = RejectionCause::classify(db_err.code().as_deref(), &message);
                AppError::BackendRejected { cause, message }
            }
            sqlx::Error::Io(e) => AppError::BackendUnavailable(e.to_string()),
            sqlx::Error::Tls(e) => AppError::BackendUnavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                AppError::BackendUnavailable("connection pool timed out".to_string())
            }
            sqlx::Error::PoolClosed => {
                AppError::BackendUnavailable("connection pool closed".to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<crate::db::csv_table::CsvTableError> for AppError {
    fn from(err: crate::db::csv_table::CsvTableError) -> Self {
        use crate::db::csv_table::CsvTableError;
        match err {
            CsvTableError::UnknownId(id) => AppError::NotFound(format!("Ride {} not found", id)),
            other => AppError::BackendUnavailable(other.to_string()),
        }
    }
}
