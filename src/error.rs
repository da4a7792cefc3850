use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Request-level failures, one HTTP status each.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Insufficient funds. Required: {required}")]
    InsufficientFunds { required: Decimal },

    #[error("{0}")]
    Unauthenticated(String),

    /// Same message for unknown username and wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Access denied")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(e) => tracing::error!(error = ?e, "internal error"),
            AppError::InvalidCredentials => tracing::warn!("invalid login attempt"),
            AppError::Forbidden => tracing::warn!("non-admin hit admin operation"),
            _ => tracing::debug!(error = %self, "request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        let body = match &self {
            AppError::Internal(_) => json!({ "message": "Internal server error" }),
            AppError::InsufficientFunds { required } => json!({
                "message": self.to_string(),
                "required": required.to_f64(),
            }),
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures surfaced by the repository traits.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique key (username) already exists.
    #[error("duplicate key")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepoError::Duplicate;
            }
        }
        RepoError::Backend(err.into())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate => AppError::Conflict("User already exists".into()),
            RepoError::Backend(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientFunds { required: Decimal::from(104) }.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let res = AppError::Internal(anyhow::anyhow!("pool timed out on 10.0.0.3")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("10.0.0.3"));
        assert!(text.contains("Internal server error"));
    }

    #[test]
    fn duplicate_maps_to_conflict() {
        let err: AppError = RepoError::Duplicate.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
