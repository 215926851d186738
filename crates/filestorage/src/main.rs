use std::error::Error;

use filestorage::{AppState, Settings, build_router, telemetry};
use filestorage_core::FileStorage;
use tokio::signal;

type AnyError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    telemetry::init();

    if let Err(err) = run().await {
        tracing::error!("storage node failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AnyError> {
    let settings = Settings::from_env()?;
    let storage = FileStorage::new(&settings.storage_root).await?;
    let state = AppState::new(storage).with_max_upload_bytes(settings.max_upload_bytes);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_address).await?;
    tracing::info!(
        "listening on http://{} (storage root: {})",
        listener.local_addr()?,
        settings.storage_root.display()
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
