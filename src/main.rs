use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use webcraft_backend::server;
use webcraft_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = webcraft_backend::bootstrap("server.log");

    let settings = match config.load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!("Refusing to start: {}", err);
            return Err(err).context("Invalid configuration");
        }
    };

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::initialize(settings).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
