//! MCP server initialization for stdio and SSE transports.
//!
//! Both entry points initialize the recommender completely before accepting a
//! single request. If initialization fails the server does not start.

use crate::config::CareerMatchConfig;
use crate::recommend::{Recommender, RecommenderCell};
use crate::tools::CareerTools;
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

/// Build the shared recommender once (behind the init barrier) and wrap config.
async fn setup_shared_state(
    config: CareerMatchConfig,
) -> Result<(Arc<Recommender>, Arc<CareerMatchConfig>)> {
    let config = Arc::new(config);
    let cell = RecommenderCell::new();

    let init_config = Arc::clone(&config);
    let recommender = cell
        .get_or_init(move || Recommender::from_config(&init_config))
        .await
        .context("recommender initialization failed; refusing to serve")?;

    Ok((recommender, config))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: CareerMatchConfig) -> Result<()> {
    tracing::info!("starting CareerMatch MCP server on stdio");

    let (recommender, config) = setup_shared_state(config).await?;

    let tools = CareerTools::new(recommender, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running: waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP (SSE) transport.
pub async fn serve_sse(config: CareerMatchConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting CareerMatch MCP server on SSE/HTTP");

    let (recommender, config) = setup_shared_state(config).await?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(CareerTools::new(recommender.clone(), config.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down SSE server");
        })
        .await?;

    Ok(())
}
