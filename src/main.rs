//! StashBox: storage backends mounted under URL paths.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                     STASHBOX                      │
//!                          │                                                   │
//!   Client Request         │  ┌─────────┐    ┌────────────┐    ┌───────────┐   │
//!   ───────────────────────┼─▶│  http   │───▶│  routing   │───▶│ dispatch  │───┼──▶ file / env / s3
//!                          │  │ server  │    │ mount table│    │  drivers  │   │
//!                          │  └─────────┘    └─────┬──────┘    └───────────┘   │
//!                          │                       │                           │
//!                          │                       ▼                           │
//!                          │                 ┌───────────┐                     │
//!                          │                 │   proxy   │─────────────────────┼──▶ upstream HTTP
//!                          │                 └───────────┘                     │
//!                          │                                                   │
//!                          │  ┌─────────────────────────────────────────────┐  │
//!                          │  │            Cross-Cutting Concerns           │  │
//!                          │  │  config (layers)  observability  lifecycle  │  │
//!                          │  └─────────────────────────────────────────────┘  │
//!                          └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use stashbox::cli::GatewayArgs;
use stashbox::lifecycle::startup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = GatewayArgs::parse();
    startup::run(args).await
}
