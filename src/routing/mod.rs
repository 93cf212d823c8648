//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Mount Table Compilation (at startup):
//!     mounts[] (declared order)
//!     → descriptor.rs (typed MountDescriptor, blank entries skipped)
//!     → driver or proxy upstream constructed per mount
//!     → Freeze as immutable MountTable
//!
//! Per request:
//!     request path
//!     → router.rs (scan in declared order)
//!     → matcher.rs (segment-aware prefix test, strip prefix)
//!     → Return: matched Mount + remainder, or no match
//! ```
//!
//! # Design Decisions
//! - Mounts compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always matches the same mount
//! - First match wins (declared order is the only priority)

pub mod descriptor;
pub mod matcher;
pub mod router;

pub use descriptor::{MountDescriptor, ProviderKind};
pub use router::{Mount, MountTable, MountTarget, RouteMatch};
