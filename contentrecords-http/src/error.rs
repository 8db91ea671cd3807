//! Error types for the HTTP host.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{BytesRejection, FormRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contentrecords_tree::TreeError;
use thiserror::Error;

pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    /// The page document could not be parsed.
    #[error("page document: {0}")]
    Document(#[from] TreeError),

    /// The page document parsed but has the wrong shape.
    #[error("invalid page: {0}")]
    Page(String),

    #[error("request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("form body: {0}")]
    Form(#[from] FormRejection),

    #[error("multipart body: {0}")]
    Multipart(#[from] MultipartRejection),

    #[error("multipart field: {0}")]
    MultipartField(#[from] MultipartError),
}

impl HostError {
    pub fn status(&self) -> StatusCode {
        match self {
            HostError::Document(_) | HostError::Page(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HostError::Body(e) => e.status(),
            HostError::Form(e) => e.status(),
            HostError::Multipart(e) => e.status(),
            HostError::MultipartField(e) => e.status(),
        }
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
