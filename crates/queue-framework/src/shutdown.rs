//! # Shutdown Signal
//!
//! Bridges process signals to a [`CancellationToken`]. The token is cancelled once, on the
//! first SIGINT (Ctrl-C) or SIGTERM, and every task holding a clone observes it.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Waits for SIGINT or SIGTERM.
///
/// If a signal handler cannot be installed, that signal is logged and ignored; the other one
/// still works.
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!(signal = "SIGINT", "Shutdown signal received"),
        () = terminate => info!(signal = "SIGTERM", "Shutdown signal received"),
    }
}

/// Spawns a task that cancels `token` on the first shutdown signal.
///
/// The task also exits quietly if the token is cancelled some other way first.
pub fn cancel_on_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = wait_for_signal() => token.cancel(),
            () = token.cancelled() => {}
        }
    })
}
