//! StashBox library: configuration, mount routing, storage drivers and
//! the HTTP gateway that ties them together.

// Core subsystems
pub mod cli;
pub mod config;
pub mod drivers;
pub mod http;
pub mod proxy;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{Configuration, GatewayConfig};
pub use http::GatewayServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
pub use routing::MountTable;
