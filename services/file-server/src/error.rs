use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use merkle::wire::ErrorBody;
use merkle::MerkleError;
use thiserror::Error;
use tracing::error;

use crate::persistence::PersistenceError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file not found in tree: {0}")]
    NotFoundInTree(String),

    /// Content was persisted but its leaf never reached the tree
    #[error("file {name} persisted but not authenticated: {reason}")]
    Unauthenticated { name: String, reason: String },

    /// Leaf is in the tree but the receipt could not be signed
    #[error("file {name} committed at position {position} but checkpoint not signed: {reason}")]
    Unsigned {
        name: String,
        position: usize,
        reason: String,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Tree(#[from] MerkleError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::NotFoundInTree(_) => StatusCode::NOT_FOUND,
            ServiceError::Tree(MerkleError::EmptyTree) => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated { .. }
            | ServiceError::Unsigned { .. }
            | ServiceError::Persistence(_)
            | ServiceError::Tree(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::NotFoundInTree(_) => "not_found_in_tree",
            ServiceError::Unauthenticated { .. } => "persisted_unauthenticated",
            ServiceError::Unsigned { .. } => "committed_unsigned",
            ServiceError::Persistence(_) => "persistence",
            ServiceError::Tree(MerkleError::EmptyTree) => "empty_tree",
            ServiceError::Tree(_) => "internal",
            ServiceError::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), "request failed: {self}");
        }
        // internal details stay in the log
        let message = match &self {
            ServiceError::Persistence(_) | ServiceError::Tree(_) if status.is_server_error() => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: message,
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
