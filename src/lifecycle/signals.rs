//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM or SIGINT (ctrl-c)
//! - Log which one arrived and fire the shutdown signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGTERM is unix-only; elsewhere only ctrl-c is watched

use super::shutdown::Shutdown;

/// Which termination signal arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Terminate,
    Interrupt,
}

impl Termination {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
        }
    }
}

/// Resolve once a termination signal arrives.
pub async fn wait_for_termination() -> std::io::Result<Termination> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = terminate.recv() => Ok(Termination::Terminate),
            result = tokio::signal::ctrl_c() => result.map(|()| Termination::Interrupt),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(Termination::Interrupt)
    }
}

/// Spawn a task that triggers `shutdown` on the first termination signal.
pub fn spawn_signal_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(signal) => {
                tracing::info!(signal = signal.name(), "{} - preparing to exit", signal.name());
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers, shutting down");
            }
        }
        shutdown.trigger();
    })
}
