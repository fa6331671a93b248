use anyhow::Context;

use quillpost_api::{app, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quillpost_observability::init();

    let config = AppConfig::from_env().context("reading configuration")?;
    let app = app::build_app(&config)
        .await
        .context("building application")?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
