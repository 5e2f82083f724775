use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use need_canvas::canvas::{convert_to_canvas, render_text};
use need_canvas::config::Config;
use need_canvas::need::StructuredNeed;
use need_canvas::server::{AppState, start_http_server};

/// Use-case canvas interview service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file (overrides NEED_CANVAS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listen address for the HTTP server
    #[arg(long, global = true)]
    bind: Option<SocketAddr>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP proxy server (default)
    Serve,
    /// Render a StructuredNeed JSON file as a use-case canvas
    Canvas {
        file: PathBuf,
        /// Email recorded as the canvas author
        #[arg(long, default_value = "anonymous")]
        submitted_by: String,
        /// Print the canvas as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_from(args.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = args.bind {
        config.server.http_bind = bind;
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.runtime.log_level))
        .init();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!(
                bind = %config.server.http_bind,
                model = config.openai.model.as_deref().unwrap_or("default"),
                "Starting need-canvas"
            );
            let state = AppState::from_config(config)?;
            start_http_server(state).await
        }
        Command::Canvas {
            file,
            submitted_by,
            json,
        } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let need: StructuredNeed = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a structured need", file.display()))?;
            let canvas = convert_to_canvas(&need, &submitted_by);
            if json {
                println!("{}", serde_json::to_string_pretty(&canvas)?);
            } else {
                println!("{}", render_text(&canvas));
            }
            Ok(())
        }
    }
}
