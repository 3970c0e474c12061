// 종료 신호 처리
// Shutdown signal handling
use tokio::signal;
use tokio::sync::watch;

/// Ctrl+C 또는 SIGTERM 수신 시 완료
/// Resolves on Ctrl+C or SIGTERM, then flips the watch channel so background
/// tasks stop before their next tick
pub async fn shutdown_signal(notify: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl_c signal received"),
        _ = terminate => tracing::info!("terminate signal received"),
    }

    let _ = notify.send(true);
}
