use anyhow::Context;
use backend::config::{Command, ServerConfig};
use backend::{app, static_paths, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    let command = Command::from_args(std::env::args().skip(1))?;
    let config = ServerConfig::load();
    config.validate()?;
    let state = AppState::from_config(&config).await?;

    if command == Command::PrintPaths {
        for (lang, id) in static_paths(state.store()) {
            println!("/{}/game/{}", lang.code(), id);
        }
        return Ok(());
    }

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "starting server");
    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
