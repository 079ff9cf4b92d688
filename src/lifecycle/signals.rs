//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Turn the first signal into the result of the signal actor
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A received signal ends the run group as an orderly shutdown

use tokio_util::sync::CancellationToken;

use crate::lifecycle::startup::RunError;

/// Wait for SIGINT or SIGTERM.
///
/// Returns `RunError::Signal` naming the signal, or `Ok(())` once `shutdown`
/// is cancelled because another actor ended the group first.
pub async fn wait_for_signal(shutdown: CancellationToken) -> Result<(), RunError> {
    let name = tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        received = next_signal() => received?,
    };

    tracing::info!(signal = name, "Shutdown signal received");
    Err(RunError::Signal(name))
}

#[cfg(unix)]
async fn next_signal() -> Result<&'static str, RunError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(RunError::SignalSetup)?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT").map_err(RunError::SignalSetup),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn next_signal() -> Result<&'static str, RunError> {
    tokio::signal::ctrl_c().await.map_err(RunError::SignalSetup)?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancellation_returns_cleanly() {
        let token = CancellationToken::new();
        let waiter = tokio::spawn(wait_for_signal(token.clone()));

        token.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("signal actor should stop on cancel")
            .unwrap();
        assert!(result.is_ok());
    }
}
