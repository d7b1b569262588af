//! Maps process signals onto transfer cancellation.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SIGNAL;

/// Cancels `token` on the first SIGTERM or SIGINT (Ctrl+C).
///
/// Returns early without cancelling if `token` is cancelled elsewhere.
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SIGNAL,
                error = %e,
                "failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        }
        tracing::info!(target: TRACING_TARGET_SIGNAL, "received Ctrl+C, cancelling transfer");
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(target: TRACING_TARGET_SIGNAL, "received SIGTERM, cancelling transfer");
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SIGNAL,
                    error = %e,
                    "failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = token.cancelled() => return,
        () = ctrl_c => {},
        () = terminate => {},
    }

    token.cancel();
}

/// Cancels `token` and waits for the `listener` task to finish.
///
/// Returns `false` if the listener panicked or was aborted.
pub async fn stop_listener(token: &CancellationToken, listener: JoinHandle<()>) -> bool {
    token.cancel();
    match listener.await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                target: TRACING_TARGET_SIGNAL,
                error = %e,
                "signal listener did not stop cleanly"
            );
            false
        }
    }
}
