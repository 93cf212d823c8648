//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! --port / --config            (overrides)
//! STASHBOX__* env vars         (environment)
//! config.json / config.toml    (file)
//! built-in values              (defaults)
//!     → layers.rs (one tree per source)
//!     → resolver.rs (first defining layer wins, per key)
//!     → schema.rs (typed GatewayConfig)
//!     → validation.rs (mount entry checks)
//!     → shared immutably with the mount table and server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; there is no reload
//! - Precedence is an ordered list of layers, not a merge
//! - Any error here aborts startup

pub mod layers;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use resolver::Configuration;
pub use schema::{GatewayConfig, LogFormat, LoggingConfig};
