use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use content_feed_core::ContentError;
use serde_json::json;

/// API error type rendered as a JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ContentError> for ApiError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            ContentError::Validation(err) => ApiError::BadRequest(err.to_string()),
            ContentError::MalformedPayload(msg) => ApiError::BadRequest(msg),
            err @ ContentError::NoTranslationAvailable(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_errors_to_statuses() {
        let bad = ApiError::from(ContentError::InvalidArgument("page size".into()));
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let fault = ApiError::from(ContentError::NoTranslationAvailable("G1".into()));
        assert!(matches!(fault, ApiError::Internal(_)));
        assert_eq!(fault.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let missing = ApiError::NotFound("post 'x'".into());
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }
}
