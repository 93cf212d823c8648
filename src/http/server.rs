//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all gateway handler
//! - Wire up middleware (request ID, tracing)
//! - Route each request to its mount: driver dispatch or proxy forward
//! - Record request metrics
//! - Serve until the shutdown signal fires

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::{ConfigError, GatewayConfig};
use crate::lifecycle::ShutdownSignal;
use crate::http::dispatch::dispatch;
use crate::http::response::DispatchOutcome;
use crate::observability::metrics;
use crate::proxy::{build_client, UpstreamClient};
use crate::routing::{MountTable, MountTarget};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mounts: Arc<MountTable>,
    pub client: UpstreamClient,
    pub max_body_size: usize,
}

/// The gateway's HTTP server.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Build every mount from the configuration. Any invalid mount is fatal.
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let mounts = MountTable::from_config(config)?;
        Ok(Self::with_mounts(mounts, config.max_body_size))
    }

    pub fn with_mounts(mounts: MountTable, max_body_size: usize) -> Self {
        let state = AppState {
            mounts: Arc::new(mounts),
            client: build_client(),
            max_body_size,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// In-flight requests are not drained: once the signal arrives the
    /// server stops and returns.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let serve = axum::serve(listener, self.router).into_future();
        tokio::select! {
            result = serve => result?,
            _ = shutdown.recv() => {
                tracing::info!("Shutdown signal received, no longer accepting connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route the request to its mount and run it there.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(route) = state.mounts.route(&path) else {
        tracing::debug!(method = %method, path = %path, "No mount matched");
        metrics::record_request(method.as_str(), "none", 404, start);
        return DispatchOutcome::NoRoute.into_response();
    };
    let mount = route.mount;

    let response = match &mount.target {
        MountTarget::Proxy(upstream) => {
            match upstream
                .forward(&state.client, route.remainder, request)
                .instrument(mount.span.clone())
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(parent: &mount.span, error = %e, "Upstream request failed");
                    DispatchOutcome::BackendError.into_response()
                }
            }
        }
        MountTarget::Driver(driver) => {
            let relative = percent_decode_str(route.remainder).decode_utf8_lossy();
            dispatch(
                driver.as_ref(),
                &method,
                &relative,
                request.into_body(),
                state.max_body_size,
            )
            .instrument(mount.span.clone())
            .await
            .into_response()
        }
    };

    metrics::record_request(
        method.as_str(),
        mount.provider(),
        response.status().as_u16(),
        start,
    );
    response
}
