use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::identity::IdentityError;
use crate::scan::ScanError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INFECTED_FILE`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `DOMAIN_NOT_ALLOWED`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `ALREADY_LIKED`, `UPSTREAM_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "No files uploaded")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// The malware scanner flagged an uploaded file.
    Infected {
        filename: String,
    },
    TokenMissing,
    TokenInvalid,
    /// Login attempt from outside the allowed email domain.
    DomainNotAllowed,
    PermissionDenied,
    NotFound(String),
    /// The caller already liked this photo.
    AlreadyLiked,
    /// An external collaborator (scan service, identity provider) failed.
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Infected { filename } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "INFECTED_FILE",
                    message: format!("Virus detected in file {filename}"),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "No token provided".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::DomainNotAllowed => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "DOMAIN_NOT_ALLOWED",
                    message: "Access denied: unauthorized email domain".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Admin access required".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::AlreadyLiked => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "ALREADY_LIKED",
                    message: "You have already liked this photo".into(),
                },
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    code: "UPSTREAM_ERROR",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => AppError::NotFound(format!("Blob {id} not found")),
            StorageError::InvalidId(_) => AppError::Validation("Invalid ID format".into()),
            StorageError::SizeLimitExceeded { actual, limit } => AppError::Validation(format!(
                "File exceeds size limit ({actual} > {limit} bytes)"
            )),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        tracing::warn!("Scan service failure: {err}");
        AppError::Upstream(err.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken(_) => AppError::TokenInvalid,
            IdentityError::Transport(msg) => {
                tracing::warn!("Identity provider failure: {msg}");
                AppError::Upstream(msg)
            }
        }
    }
}
