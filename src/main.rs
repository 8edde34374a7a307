use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::error;

use weatherbot::{RequestOrigin, WeatherAssistant, WeatherBotConfig, chat, telemetry, web};

#[derive(Parser)]
#[command(
    name = "weatherbot",
    version,
    about = "Conversational weather assistant: ask about today's weather, rain, sunrise and sunset"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat interactively (default)
    Chat,
    /// Answer a single query and exit
    Ask {
        /// The question, e.g. "will it rain today"
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Serve the chat page and the POST /get endpoint
    Serve {
        /// Port to listen on, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = WeatherBotConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let assistant = WeatherAssistant::from_config(&config)
        .map_err(|e| anyhow::anyhow!("{}\n{}", e.user_message(), e))?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let stdin = BufReader::new(tokio::io::stdin());
            chat::run(&assistant, &RequestOrigin::local(), stdin, tokio::io::stdout()).await?;
        }
        Command::Ask { query } => {
            let query = query.join(" ");
            match assistant.answer(&query, &RequestOrigin::local()).await {
                Ok(answer) => println!("{answer}"),
                Err(e) => {
                    error!("Failed to answer query: {}", e);
                    eprintln!("{}", e.user_message());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(Arc::new(assistant), &config.server).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
