use std::sync::Arc;

use anyhow::Context;

use closingdesk_api::config::ApiConfig;
use closingdesk_infra::Engine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    closingdesk_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    if config.engine.journal_path.is_none() {
        tracing::warn!("CLOSINGDESK_JOURNAL_PATH not set; state is kept in memory only");
    }

    let engine = Engine::from_config(&config.engine).context("failed to open ledger store")?;
    let app = closingdesk_api::app::build_app(Arc::new(engine));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
