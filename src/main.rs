use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use azure_price_agent::{Config, PriceAgentService, http};

#[tokio::main]
async fn main() -> Result<()> {
    azure_price_agent::init_tracing();

    // Load configuration once; components receive it by reference
    let config = Arc::new(Config::load());

    let service = PriceAgentService::new(&config).context("failed to build price agent service")?;

    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid server.bind '{}'", config.server.bind))?;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(
        %bind,
        filter_model = %config.filter_llm.model,
        answer_model = %config.answer_llm.model,
        "Starting price agent HTTP server"
    );

    axum::serve(listener, http::router(service)).await?;
    Ok(())
}
