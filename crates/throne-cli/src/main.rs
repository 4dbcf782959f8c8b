use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use throne_cli::{api, app};
use throne_core::{ChatController, FileStorage, SessionStore, Settings};

#[derive(Parser)]
#[command(name = "throne")]
#[command(about = "Throne Room - persona chat with primary, local and static fallbacks")]
#[command(version)]
struct Cli {
    /// Model to request (primary-style names go to the primary provider)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session storage file for the terminal chat
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Address to bind, e.g. 127.0.0.1:3000
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat in the terminal (default)
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Chat);

    let default_filter = match command {
        Command::Serve { .. } => "info",
        Command::Chat => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let mut settings = match cli.config {
        Some(ref path) => Settings::load_from(path),
        None => Settings::load(),
    };
    if let Some(ref model) = cli.model {
        let prefix = &settings.primary.model_prefix;
        if !prefix.is_empty() && model.contains(prefix.as_str()) {
            settings.primary.model = model.clone();
        } else {
            settings.secondary.default_model = model.clone();
        }
    }
    if let Some(storage) = cli.storage {
        settings.storage.path = Some(storage);
    }

    let gateway = Arc::new(settings.build_gateway()?);

    match command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            api::start_server(gateway, &bind).await?;
        }
        Command::Chat => {
            let storage = FileStorage::open(settings.storage_path())?;
            let store = SessionStore::open(Box::new(storage))
                .with_max_sessions(settings.storage.max_sessions_per_device);
            let model = cli.model.unwrap_or_else(|| settings.primary.model.clone());
            let controller = ChatController::new(gateway, store, model);
            app::run_chat(&controller).await?;
        }
    }

    Ok(())
}
