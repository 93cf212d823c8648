//! Proxy mounts.
//!
//! # Responsibilities
//! - Parse and validate the upstream of a `proxy` mount at startup
//! - Rewrite the request URI: upstream authority, `basePath` + remainder
//! - Forward method, headers and body; relay the upstream response
//!
//! # Data Flow
//! ```text
//! GET /api/users?page=2   (mount "/api", host "localhost:3000", basePath "/v1")
//!     → remainder "/users", query "page=2"
//!     → http://localhost:3000/v1/users?page=2
//!     → upstream response relayed unmodified
//! ```
//!
//! # Design Decisions
//! - `http` and `https` upstreams; any other scheme is rejected at startup
//! - A scheme-less `host` is plain HTTP
//! - No retries: a failed upstream call surfaces immediately
//! - The `Host` header is the only header rewritten

use axum::body::Body;
use axum::http::header::{HeaderValue, HOST};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::ConfigError;
use crate::routing::descriptor::MountDescriptor;

/// Shared HTTP client for all proxy mounts.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Client that speaks both plain HTTP and TLS, per upstream URI scheme.
pub fn build_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpsConnector::new())
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Where a proxy mount forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUpstream {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
}

impl ProxyUpstream {
    pub fn new(scheme: Scheme, authority: Authority, base_path: &str) -> Self {
        Self {
            scheme,
            authority,
            base_path: base_path.trim_end_matches('/').to_string(),
        }
    }

    /// Requires `host`; `basePath` is optional.
    pub fn from_descriptor(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let host = descriptor.required_str("host")?;
        let (scheme, authority) =
            parse_host(host).map_err(|message| descriptor.invalid("host", message))?;

        let base_path = descriptor.optional_str("basePath")?.unwrap_or_default();
        if !base_path.is_empty() && !base_path.starts_with('/') {
            return Err(descriptor.invalid("basePath", "must start with '/'"));
        }

        tracing::info!(
            mount = %descriptor.mount_path,
            upstream = %authority,
            scheme = %scheme,
            base_path,
            "Proxying to upstream"
        );
        Ok(Self::new(scheme, authority, base_path))
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Upstream URI for a mount remainder and optional query string.
    pub fn upstream_uri(&self, remainder: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let path = match query {
            Some(query) => format!("{}{remainder}?{query}", self.base_path),
            None => format!("{}{remainder}", self.base_path),
        };
        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(PathAndQuery::try_from(path)?)
            .build()
    }

    /// Forward `request` upstream, replacing its URI and `Host` header.
    pub async fn forward(
        &self,
        client: &UpstreamClient,
        remainder: &str,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.upstream_uri(remainder, parts.uri.query())?;
        parts.version = Version::HTTP_11;
        if let Ok(host) = HeaderValue::from_str(self.authority.as_str()) {
            parts.headers.insert(HOST, host);
        }

        tracing::debug!(uri = %parts.uri, method = %parts.method, "Forwarding upstream");
        let response: Response<Incoming> = client.request(Request::from_parts(parts, body)).await?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// Accepts `host[:port]`, `http://host[:port]` or `https://host[:port]`,
/// optionally with a trailing `/`.
fn parse_host(host: &str) -> Result<(Scheme, Authority), String> {
    let (scheme, rest) = match host.split_once("://") {
        Some(("http", rest)) => (Scheme::HTTP, rest),
        Some(("https", rest)) => (Scheme::HTTPS, rest),
        Some((scheme, _)) => return Err(format!("unsupported upstream scheme '{scheme}'")),
        None => (Scheme::HTTP, host),
    };
    let rest = rest.trim_end_matches('/');
    if rest.contains('/') {
        return Err(format!("'{host}' must not contain a path, use basePath"));
    }
    let authority = rest
        .parse::<Authority>()
        .map_err(|e| format!("invalid upstream host '{host}': {e}"))?;
    Ok((scheme, authority))
}
