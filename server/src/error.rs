use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use mezban::{ApplicationError, StorageError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing or invalid identity")]
    Unauthenticated,

    #[error("Administrator role required")]
    Forbidden,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Internal error")]
    Internal,

    #[error(transparent)]
    Application(#[from] ApplicationError),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Application(e) => match e {
                ApplicationError::NotFound(_) => StatusCode::NOT_FOUND,
                ApplicationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Caller-facing message. Storage internals never leak; they are
    /// already logged where they occurred.
    fn public_message(&self) -> String {
        match self {
            ApiError::Application(ApplicationError::Storage(_)) => {
                "Failed to process application, please try again".to_string()
            }
            ApiError::Upload(_) => "Failed to store uploaded file, please try again".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
