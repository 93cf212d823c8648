//! HTTP-facing outcomes.
//!
//! # Responsibilities
//! - Name every result a request can end in
//! - Map each outcome to a status code and a fixed body
//!
//! # Design Decisions
//! - Outcomes carry no backend error detail, so nothing from a driver
//!   failure can reach a response body
//! - Content is served as `application/octet-stream`, listings as JSON

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;

use crate::drivers::DirEntry;

pub const NOT_FOUND_BODY: &str = "Not found";
pub const FORBIDDEN_BODY: &str = "Forbidden";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error";
pub const PAYLOAD_TOO_LARGE_BODY: &str = "Payload Too Large";
pub const OK_BODY: &str = "OK";

/// Result of routing and dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `read` returned content.
    Content(Bytes),
    /// `read` on a directory.
    Listing(Vec<DirEntry>),
    /// `exists` returned true.
    Found,
    /// `write` or `delete` succeeded.
    Done,
    /// Nothing stored at the path.
    NotFound,
    /// No mount matched the request path.
    NoRoute,
    /// Method unknown, or capability missing on the mount's driver.
    Unsupported,
    /// The backend failed; detail is in the logs.
    BackendError,
    /// Request body over the configured limit.
    PayloadTooLarge,
}

impl DispatchOutcome {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Content(_) | Self::Listing(_) | Self::Found | Self::Done => StatusCode::OK,
            Self::NotFound | Self::NoRoute => StatusCode::NOT_FOUND,
            Self::Unsupported => StatusCode::FORBIDDEN,
            Self::BackendError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Content(content) => (
                status,
                [(header::CONTENT_TYPE, "application/octet-stream")],
                content,
            )
                .into_response(),
            Self::Listing(entries) => (status, Json(entries)).into_response(),
            Self::Found => status.into_response(),
            Self::Done => (status, OK_BODY).into_response(),
            Self::NotFound | Self::NoRoute => (status, NOT_FOUND_BODY).into_response(),
            Self::Unsupported => (status, FORBIDDEN_BODY).into_response(),
            Self::BackendError => (status, INTERNAL_ERROR_BODY).into_response(),
            Self::PayloadTooLarge => (status, PAYLOAD_TOO_LARGE_BODY).into_response(),
        }
    }
}
