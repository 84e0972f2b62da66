//! todo-api バイナリのエントリポイント
//! 設定に従ってストレージを初期化し、HTTP サーバを起動します。

use anyhow::Context;
use shared::{init_tracing, Config};
use todo_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing().map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        backend = config.storage_backend.as_str(),
        environment = %config.environment,
        "configuration loaded"
    );

    // ストレージは起動時に一度だけ構築し、ルータへ注入する
    let repo = infrastructure::connect(&config)
        .await
        .context("failed to initialize storage")?;

    let router = app(AppState::new(repo.clone()), &config.cors_allowed_origins);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    repo.shutdown().await.context("failed to release storage")?;
    tracing::info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
