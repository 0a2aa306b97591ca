// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` on SIGINT or SIGTERM.
///
/// Uses `notify_one`, so a signal that arrives before the server loop
/// starts waiting is not lost.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_warning(&format!(
                    "Failed to register SIGTERM handler, falling back to Ctrl+C only: {e}"
                ));
                wait_for_ctrl_c(&shutdown).await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_shutdown("SIGTERM received"),
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    logger::log_error(&format!("Failed to listen for SIGINT: {e}"));
                    return;
                }
                logger::log_shutdown("SIGINT received");
            }
        }
        shutdown.notify_one();
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        wait_for_ctrl_c(&shutdown).await;
    });
}

async fn wait_for_ctrl_c(shutdown: &Notify) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            logger::log_shutdown("Ctrl+C received");
            shutdown.notify_one();
        }
        Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
    }
}
