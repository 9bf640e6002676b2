//! Error taxonomy. One enum per concern, plus `ApiError` which maps each of
//! them onto the `{ "error": ... }` JSON body the HTTP surface promises.
//!
//! Every error is terminal for the attempt: no retry, no backoff, no partial
//! recovery. The client re-initiates the action.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Upload / text-extraction failures.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file format{0}")]
    Unsupported(String),
    #[error("could not read file: {0}")]
    Corrupt(String),
    #[error("no text could be extracted from the file")]
    Empty,
}

/// Generation provider failures. All-or-nothing: a malformed response is as
/// fatal as a transport error, and no partial question set is ever accepted.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation provider is not configured (missing API key)")]
    NotConfigured,
    #[error("provider call failed: {0}")]
    Provider(String),
    #[error("provider response was not valid JSON: {0}")]
    Unparseable(String),
    #[error("provider response had the wrong shape: {0}")]
    BadShape(String),
}

/// Invalid transitions on a quiz session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("quiz already submitted")]
    AlreadySubmitted,
    #[error("question index {index} out of range (quiz has {len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("answer '{0}' is not an option for this question")]
    NotAnOption(String),
    #[error("quiz has not been submitted yet")]
    NotSubmitted,
}

/// PDF rendering failures. Not expected under normal input sizes.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("pdf rendering failed: {0}")]
    Render(String),
}

/// Request-level validation failures, checked before any provider call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a file must be uploaded before generating a quiz")]
    EmptyContent,
    #[error("question count must be at least 1")]
    BadCount,
}

/// Top-level error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] IngestError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unknown session id: {0}")]
    UnknownSession(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Session(_) => StatusCode::CONFLICT,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownSession(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
