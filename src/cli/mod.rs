//! Command-line interface.

pub mod commands;
pub mod display;
mod types;

use anyhow::Result;

pub use types::{Cli, Commands};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::infrastructure::AppContext;

/// Run one parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let json_mode = cli.json;

    match cli.command {
        // init writes the config the other commands read
        Commands::Init(args) => commands::init::execute(args, json_mode).await,
        command => {
            let config = load_config(cli.config.as_deref())?;
            let _logger = LoggerImpl::init(&config.logging)?;
            let ctx = AppContext::build(config).await?;
            dispatch(command, ctx, json_mode).await
        }
    }
}

async fn dispatch(command: Commands, ctx: AppContext, json_mode: bool) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(args, json_mode).await,
        Commands::Serve(args) => commands::serve::execute(args, ctx).await,
        Commands::Range(args) => commands::range::execute(args, ctx, json_mode).await,
        Commands::Add(args) => commands::add::execute(args, ctx, json_mode).await,
        Commands::List(args) => commands::list::execute(args, ctx, json_mode).await,
        Commands::ClearCache(args) => commands::clear_cache::execute(args, ctx, json_mode).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Report a failed command and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1)
}
