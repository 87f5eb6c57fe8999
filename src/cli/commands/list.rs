//! Implementation of the `graphpoint list` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::display::{output, points_table, render_list, CommandOutput};
use crate::domain::models::{Category, DataPoint};
use crate::infrastructure::AppContext;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Graph type (line or bar)
    #[arg(short = 't', long = "type")]
    pub graph_type: String,
}

#[derive(Debug, Serialize)]
pub struct ListOutput {
    #[serde(rename = "type")]
    pub graph_type: Category,
    pub points: Vec<DataPoint>,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        render_list("point", &points_table(&self.points), self.points.len())
    }
}

pub async fn execute(args: ListArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let category = Category::parse(&args.graph_type)?;
    let points = ctx.point_service().list_points(category).await?;

    output(
        &ListOutput {
            graph_type: category,
            points,
        },
        json_mode,
    );
    Ok(())
}
