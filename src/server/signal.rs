// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Start the shutdown signal listener
///
/// Returns a `Notify` that fires once when the process is asked to stop.
#[cfg(unix)]
pub fn shutdown_signal() -> std::io::Result<Arc<Notify>> {
    use tokio::signal::unix::{signal, SignalKind};

    let shutdown = Arc::new(Notify::new());
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let notify = Arc::clone(&shutdown);
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                crate::logger::log_info("[SIGNAL] SIGTERM received, shutting down");
            }
            _ = sigint.recv() => {
                crate::logger::log_info("[SIGNAL] SIGINT received (Ctrl+C), shutting down");
            }
        }
        notify.notify_one();
    });

    Ok(shutdown)
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn shutdown_signal() -> std::io::Result<Arc<Notify>> {
    let shutdown = Arc::new(Notify::new());
    let notify = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            crate::logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
            notify.notify_one();
        }
    });
    Ok(shutdown)
}
