use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// `axum::Json` whose rejections (bad syntax, wrong field types, missing
/// content type) come back as a 400 `{message}` body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "json body rejected");
        AppError::Validation(rejection.body_text())
    }
}

/// Deserializes a raw body after the handler has done its own checks.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        amount: u32,
    }

    #[tokio::test]
    async fn rejections_become_validation_errors() {
        let req = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(r#"{"amount":"abc"}"#))
            .unwrap();
        let err = JsonBody::<Body>::from_request(req, &()).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let req = axum::http::Request::builder()
            .method("POST")
            .body(axum::body::Body::from(r#"{"amount":1}"#))
            .unwrap();
        let err = JsonBody::<Body>::from_request(req, &()).await.err().unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parse_json_reports_bad_input() {
        let body: Body = parse_json(br#"{"amount":7}"#).unwrap();
        assert_eq!(body.amount, 7);
        assert!(matches!(
            parse_json::<Body>(b"not json"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(parse_json::<Body>(b""), Err(AppError::Validation(_))));
    }
}
