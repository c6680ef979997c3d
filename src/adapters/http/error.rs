use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::RelayError;

pub fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
        RelayError::MetadataUnavailable { .. } => StatusCode::NOT_FOUND,
        RelayError::TranscodeFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        RelayError::StreamInterrupted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        RelayError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (status_for(&self), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&RelayError::malformed("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&RelayError::metadata("x")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&RelayError::transcode("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_for(&RelayError::Overloaded), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = RelayError::metadata("private").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Video not found or inaccessible");
    }
}
