use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Input problems detected before the database is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name required")]
    NameRequired,
    #[error("email required")]
    EmailRequired,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid role")]
    InvalidRole,
    #[error("invalid request body: {0}")]
    MalformedBody(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("email already registered")]
    Conflict,

    #[error("signups table not found; run the database migrations first")]
    SchemaMissing(#[source] sqlx::Error),

    #[error("database connection failed; check that PostgreSQL is running")]
    Unavailable(#[source] sqlx::Error),

    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

/// The error taxonomy storage failures are sorted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    SchemaMissing,
    DatastoreUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::SchemaMissing | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::DatastoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// PostgreSQL SQLSTATE code to taxonomy kind.
pub fn classify_sqlstate(code: &str) -> ErrorKind {
    match code {
        // unique_violation
        "23505" => ErrorKind::Conflict,
        // undefined_table
        "42P01" => ErrorKind::SchemaMissing,
        // connection_exception class, shutdowns, too_many_connections
        "08000" | "08001" | "08003" | "08004" | "08006" | "57P01" | "57P02" | "57P03"
        | "53300" => ErrorKind::DatastoreUnavailable,
        _ => ErrorKind::Internal,
    }
}

pub fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::Database(db) => db
            .code()
            .map(|code| classify_sqlstate(&code))
            .unwrap_or(ErrorKind::Internal),
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => ErrorKind::DatastoreUnavailable,
        _ => ErrorKind::Internal,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match classify(&err) {
            ErrorKind::Conflict => AppError::Conflict,
            ErrorKind::SchemaMissing => AppError::SchemaMissing(err),
            ErrorKind::DatastoreUnavailable => AppError::Unavailable(err),
            ErrorKind::Validation | ErrorKind::Internal => AppError::Internal(err.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Conflict => ErrorKind::Conflict,
            AppError::SchemaMissing(_) => ErrorKind::SchemaMissing,
            AppError::Unavailable(_) => ErrorKind::DatastoreUnavailable,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Internal(e) => Some(format!("{e:#}")),
            _ => None,
        }
    }

    /// Renders the JSON error body. The underlying text of an internal error
    /// is attached only when `expose_details` is set (development mode).
    pub fn into_response_with(self, expose_details: bool) -> Response {
        let status = self.kind().status();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            details: if expose_details { self.details() } else { None },
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}
