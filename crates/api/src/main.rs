use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use blogapi_api::app::{self, services};
use blogapi_infra::config::{self, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = config::load_dotenv();
    blogapi_observability::init();
    if !dotenv_loaded {
        tracing::warn!("no .env file found; relying on process environment");
    }

    let config = AppConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))
        .context("invalid configuration")?;

    let services = services::build_services(&config.database)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to initialize database"))
        .context("failed to initialize database")?;
    let services = Arc::new(services);

    let app = app::build_app(services.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("server stopped; closing post store");
    services
        .posts
        .close()
        .await
        .context("failed to close post store")?;

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
