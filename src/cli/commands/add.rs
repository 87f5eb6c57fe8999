//! Implementation of the `graphpoint add` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::{output, CommandOutput};
use crate::domain::models::{Category, PointEvent};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Graph type (line or bar)
    #[arg(short = 't', long = "type")]
    pub graph_type: String,

    /// RFC3339 timestamp or YYYY-MM-DD; only the day is kept
    #[arg(long)]
    pub timestamp: String,

    #[arg(short, allow_negative_numbers = true)]
    pub x: i64,

    #[arg(short, allow_negative_numbers = true)]
    pub y: i64,
}

#[derive(Debug, Serialize)]
pub struct AddOutput {
    pub success: bool,
    pub point: PointEvent,
}

impl CommandOutput for AddOutput {
    fn to_human(&self) -> String {
        format!(
            "Added {} point ({}, {}) for {}",
            self.point.graph_type, self.point.x, self.point.y, self.point.timestamp
        )
    }
}

pub async fn execute(args: AddArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let category = Category::parse(&args.graph_type)?;
    let point = ctx
        .point_service()
        .add_point(category, &args.timestamp, args.x, args.y)
        .await?;

    output(&AddOutput { success: true, point }, json_mode);
    Ok(())
}
