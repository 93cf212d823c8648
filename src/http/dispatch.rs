//! Method-to-capability dispatch for driver mounts.
//!
//! # Data Flow
//! ```text
//! (method, decoded path, body)
//!     → Capability::for_method      unknown method      → Unsupported (403)
//!     → driver.capabilities()       capability missing  → Unsupported (403)
//!     → read / exists / write / delete
//!     → DispatchOutcome             driver error        → BackendError (500)
//! ```
//!
//! # Design Decisions
//! - Every dispatch is logged before the driver is called
//! - Driver errors are logged here and dropped; only the outcome
//!   crosses the HTTP boundary
//! - The body is only read for `write`

use std::error::Error as StdError;

use axum::body::Body;
use axum::http::Method;
use http_body_util::LengthLimitError;

use super::response::DispatchOutcome;
use crate::drivers::{Capability, DriverError, ReadOutcome, StorageDriver};

/// Run one request against a driver.
pub async fn dispatch(
    driver: &dyn StorageDriver,
    method: &Method,
    path: &str,
    body: Body,
    max_body_size: usize,
) -> DispatchOutcome {
    let provider = driver.provider();
    tracing::info!(method = %method, path, provider, "Processing request");

    let Some(capability) = Capability::for_method(method) else {
        tracing::error!(provider, method = %method, "Method not supported by gateway");
        return DispatchOutcome::Unsupported;
    };
    if !driver.capabilities().supports(capability) {
        tracing::error!(provider, method = %method, %capability, "Provider does not support method");
        return DispatchOutcome::Unsupported;
    }

    match capability {
        Capability::Read => match driver.read(path).await {
            Ok(ReadOutcome::NotFound) => DispatchOutcome::NotFound,
            Ok(ReadOutcome::Content(content)) => DispatchOutcome::Content(content),
            Ok(ReadOutcome::Listing(entries)) => DispatchOutcome::Listing(entries),
            Err(e) => backend_error(provider, method, path, e),
        },
        Capability::Exists => match driver.exists(path).await {
            Ok(true) => DispatchOutcome::Found,
            Ok(false) => DispatchOutcome::NotFound,
            Err(e) => backend_error(provider, method, path, e),
        },
        Capability::Write => {
            let content = match axum::body::to_bytes(body, max_body_size).await {
                Ok(content) => content,
                Err(e) if exceeds_limit(&e) => {
                    tracing::warn!(provider, path, limit = max_body_size, "Request body too large");
                    return DispatchOutcome::PayloadTooLarge;
                }
                Err(e) => {
                    tracing::error!(provider, path, error = %e, "Failed to read request body");
                    return DispatchOutcome::BackendError;
                }
            };
            match driver.write(path, content).await {
                Ok(()) => DispatchOutcome::Done,
                Err(e) => backend_error(provider, method, path, e),
            }
        }
        Capability::Delete => match driver.delete(path).await {
            Ok(()) => DispatchOutcome::Done,
            Err(e) => backend_error(provider, method, path, e),
        },
    }
}

fn backend_error(provider: &str, method: &Method, path: &str, error: DriverError) -> DispatchOutcome {
    tracing::error!(provider, method = %method, path, error = %error, "Backend error");
    DispatchOutcome::BackendError
}

fn exceeds_limit(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(err) = source {
        if err.is::<LengthLimitError>() {
            return true;
        }
        source = err.source();
    }
    false
}
