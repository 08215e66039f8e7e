//! Error types for the document cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Storage Error Enum ==
/// Failures raised by a storage engine primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A document with this identifier is already stored
    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    /// The supplied identifier is not a string
    #[error("Document id must be a string, got {0}")]
    InvalidId(String),

    /// An update tried to change a document's identifier
    #[error("Document id cannot be changed: {0}")]
    ImmutableId(String),

    /// An array operator targeted a non-array value
    #[error("Field '{0}' is not an array")]
    NotAnArray(String),

    /// Empty path segment, or a path that walks through a scalar
    #[error("Invalid field path: '{0}'")]
    InvalidPath(String),
}

impl StorageError {
    /// True for errors caused by a conflict with stored state.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StorageError::DuplicateId(_) | StorageError::ImmutableId(_))
    }
}

// == Cache Error Enum ==
/// Unified error type for the document cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No collection registered under this name
    #[error("No collection registered under '{0}'")]
    NotFound(String),

    /// A collection with this name already exists
    #[error("Collection already exists: {0}")]
    AlreadyExists(String),

    /// Malformed query or request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The storage engine rejected the operation
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::AlreadyExists(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Storage(err) if err.is_constraint_violation() => StatusCode::CONFLICT,
            CacheError::Storage(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the document cache.
pub type Result<T> = std::result::Result<T, CacheError>;
