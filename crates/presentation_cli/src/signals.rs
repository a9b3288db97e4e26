//! Ctrl+C and SIGTERM handling

use application::InterruptHandle;
use tokio::signal;
use tracing::{error, warn};

/// Interrupt `handle` on the first Ctrl+C or SIGTERM
///
/// Running operations see the interrupt and take their exit path (restore,
/// commit or rollback) before the process ends.
pub fn spawn_listener(handle: InterruptHandle) {
    tokio::spawn(async move {
        wait_for_signal().await;
        handle.interrupt();
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, finishing current operation");
        }
        () = terminate => {
            warn!("Received SIGTERM, finishing current operation");
        }
    }
}
