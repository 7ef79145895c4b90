//! Shutdown driven by process signals.

use std::fmt;
use std::io;

use super::ShutdownReport;
use crate::{CancellationToken, Injector};

/// What ended the wait in [`Injector::shutdown_on_signals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownTrigger {
    /// Ctrl-C / SIGINT.
    Interrupt,
    /// SIGTERM (unix only).
    Terminate,
    /// The caller's token was cancelled.
    Cancelled,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Interrupt => write!(f, "interrupt"),
            ShutdownTrigger::Terminate => write!(f, "terminate"),
            ShutdownTrigger::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Injector {
    /// Waits for SIGINT or SIGTERM, then shuts the whole tree down.
    ///
    /// # Errors
    ///
    /// Fails only when the signal handlers cannot be installed; nothing is
    /// shut down in that case.
    pub async fn shutdown_on_signals(&self) -> io::Result<(ShutdownTrigger, ShutdownReport)> {
        self.shutdown_on_signals_with(&CancellationToken::new()).await
    }

    /// Like [`shutdown_on_signals`](Self::shutdown_on_signals), but also stops
    /// waiting when `token` is cancelled.
    ///
    /// The shutdown itself runs with a fresh token, so a cancelled `token`
    /// still tears every service down.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> std::io::Result<()> {
    /// use ferrous_injector::{CancellationToken, Injector, ShutdownTrigger};
    ///
    /// let injector = Injector::new();
    /// let token = CancellationToken::new();
    /// token.cancel();
    ///
    /// let (trigger, report) = injector.shutdown_on_signals_with(&token).await?;
    /// assert_eq!(trigger, ShutdownTrigger::Cancelled);
    /// assert!(report.is_ok());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn shutdown_on_signals_with(
        &self,
        token: &CancellationToken,
    ) -> io::Result<(ShutdownTrigger, ShutdownReport)> {
        let trigger = tokio::select! {
            signal = wait_for_signal() => signal?,
            _ = token.cancelled() => ShutdownTrigger::Cancelled,
        };
        tracing::info!(target: "ferrous_injector", %trigger, "shutting down on signal");

        let root = self.root().clone();
        let report = match tokio::task::spawn_blocking(move || root.shutdown()).await {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!(target: "ferrous_injector", %error, "shutdown task failed, retrying inline");
                self.shutdown()
            }
        };
        Ok((trigger, report))
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<ShutdownTrigger> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => interrupted.map(|()| ShutdownTrigger::Interrupt),
        _ = terminate.recv() => Ok(ShutdownTrigger::Terminate),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<ShutdownTrigger> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownTrigger::Interrupt)
}
