//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::{
    add::AddArgs, clear_cache::ClearCacheArgs, init::InitArgs, list::ListArgs, range::RangeArgs,
    serve::ServeArgs,
};

#[derive(Parser, Debug)]
#[command(name = "graphpoint")]
#[command(about = "graphpoint - cached range queries over daily graph data", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to .graphpoint/config.yaml and local.yaml)
    #[arg(short, long, global = true, env = "GRAPHPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init(InitArgs),

    /// Run the HTTP server
    Serve(ServeArgs),

    /// Query the points of one graph over a date range
    Range(RangeArgs),

    /// Add one point
    Add(AddArgs),

    /// List every point of one graph
    List(ListArgs),

    /// Flush the configured cache
    ClearCache(ClearCacheArgs),
}
