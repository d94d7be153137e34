//! Service entry point: tracing, environment, state wiring, axum server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use codewarden::api::{self, AppState};
use codewarden::sandbox::DockerCli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("codewarden=info")),
        )
        .init();

    if let Some(path) = codewarden::env::load_dotenv(false) {
        info!(path = %path.display(), "applied local .env");
    }

    let runtime = Arc::new(DockerCli::new());
    let state = Arc::new(AppState::new(runtime)?);

    let addr =
        std::env::var("CODEWARDEN_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".to_owned());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "codewarden listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
