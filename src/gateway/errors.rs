use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::FileError;

use super::handlers::ApiResponse;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    File(#[from] FileError),
    #[error("invalid url {0:?}")]
    InvalidUrl(String),
    #[error("job {0} not found")]
    JobNotFound(Uuid),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::File(FileError::InvalidName(_)) | GatewayError::InvalidUrl(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            GatewayError::File(FileError::NotFound(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "File Not Found".to_string())
            }
            GatewayError::File(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            GatewayError::JobNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
        };

        if status.is_server_error() {
            tracing::error!(target: "gateway", error = %self, "request failed");
        } else {
            tracing::debug!(target: "gateway", error = %self, "request rejected");
        }

        (status, Json(ApiResponse::new(status, message))).into_response()
    }
}
