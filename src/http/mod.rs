//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace layer)
//!     → routing layer picks the mount
//!     → dispatch.rs (driver mounts) or proxy forward (proxy mounts)
//!     → response.rs (outcome → status + fixed body)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod response;
pub mod server;

pub use response::DispatchOutcome;
pub use server::GatewayServer;
