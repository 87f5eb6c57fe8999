//! Implementation of the `graphpoint clear-cache` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::{output, CommandOutput};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ClearCacheArgs {}

#[derive(Debug, Serialize)]
pub struct ClearCacheOutput {
    pub success: bool,
    pub backend: &'static str,
}

impl CommandOutput for ClearCacheOutput {
    fn to_human(&self) -> String {
        format!("Cleared the {} cache", self.backend)
    }
}

pub async fn execute(_args: ClearCacheArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    ctx.point_service().clear_cache().await?;

    output(
        &ClearCacheOutput {
            success: true,
            backend: ctx.cache.backend_name(),
        },
        json_mode,
    );
    Ok(())
}
