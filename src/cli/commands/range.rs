//! Implementation of the `graphpoint range` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{output, points_table, render_list, CommandOutput};
use crate::domain::models::{Category, DataPoint, DateRange};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct RangeArgs {
    /// Graph type (line or bar)
    #[arg(short = 't', long = "type")]
    pub graph_type: String,

    /// First day, YYYY-MM-DD
    #[arg(short, long)]
    pub start: String,

    /// Last day (inclusive), YYYY-MM-DD
    #[arg(short, long)]
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct RangeOutput {
    #[serde(rename = "type")]
    pub graph_type: Category,
    pub start: String,
    pub end: String,
    pub points: Vec<DataPoint>,
}

impl CommandOutput for RangeOutput {
    fn to_human(&self) -> String {
        let table = points_table(&self.points);
        format!(
            "{} {}..{}\n{}",
            self.graph_type,
            self.start,
            self.end,
            render_list("point", &table, self.points.len())
        )
    }
}

pub async fn execute(args: RangeArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let category = Category::parse(&args.graph_type)?;
    let range = DateRange::parse(&args.start, &args.end, ctx.config.query.max_range_days)?;

    let points = ctx
        .range_query_service()
        .query(category, &range)
        .await
        .with_context(|| format!("Range query for {category} {}..{} failed", range.start(), range.end()))?;

    output(
        &RangeOutput {
            graph_type: category,
            start: range.start().to_string(),
            end: range.end().to_string(),
            points,
        },
        json_mode,
    );
    Ok(())
}
