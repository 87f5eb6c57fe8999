//! Implementation of the `graphpoint serve` command.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::adapters::http::{GraphHttpConfig, GraphHttpServer};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured port
    #[arg(short, long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, ctx: AppContext) -> Result<()> {
    let mut config = GraphHttpConfig::from(&ctx.config);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let server = GraphHttpServer::new(ctx.range_query_service(), ctx.point_service(), config);
    server
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {e}"))?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
