//! Eumicus - personal knowledge assistant.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eumicus::cli::{run_menu, App};
use eumicus::config::ConfigLoader;
use eumicus::content::ContentFetcher;
use eumicus::display;
use eumicus::llm::LlmClient;
use eumicus::server::ApiServer;
use eumicus::store::Store;

#[derive(Parser)]
#[command(
    name = "eumicus",
    about = "Personal knowledge assistant with spaced repetition",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process content items (URLs or raw text).
    Process {
        /// URLs or text to process, in order.
        #[arg(required = true)]
        content: Vec<String>,
    },
    /// Run a reinforcement quiz over concepts due for review.
    Reinforce,
    /// Generate exploration suggestions.
    Suggest,
    /// Run a reflection session over recent activity.
    Reflect,
    /// Update the learning profile interactively.
    Profile,
    /// Show knowledge store statistics.
    Stats,
    /// Erase all stored data.
    Reset,
    /// Start the web API server.
    Serve,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Option<Commands>) -> Result<(), String> {
    let config = ConfigLoader::new().load().map_err(|e| e.to_string())?;
    let store = Store::open(config.store.data_dir.clone())
        .await
        .map_err(|e| e.to_string())?;
    let llm = LlmClient::from_config(&config.llm).map_err(|e| e.to_string())?;
    let fetcher = ContentFetcher::new(config.fetch.clone());

    if let Some(Commands::Serve) = command {
        let server = ApiServer::new(
            config.server,
            Arc::new(Mutex::new(store)),
            Arc::new(llm),
            Arc::new(fetcher),
        );
        return server.run().await.map_err(|e| e.to_string());
    }

    let mut app = App {
        store,
        llm,
        fetcher,
    };

    match command {
        Some(Commands::Process { content }) => app.process(&content).await.map_err(|e| e.to_string()),
        Some(Commands::Reinforce) => app.reinforce().await.map_err(|e| e.to_string()),
        Some(Commands::Suggest) => app.suggest().await.map_err(|e| e.to_string()),
        Some(Commands::Reflect) => app.reflect().await.map_err(|e| e.to_string()),
        Some(Commands::Profile) => app.profile().await.map_err(|e| e.to_string()),
        Some(Commands::Stats) => {
            app.stats();
            Ok(())
        }
        Some(Commands::Reset) => app.reset().await.map_err(|e| e.to_string()),
        Some(Commands::Serve) => unreachable!("handled above"),
        None => {
            run_menu(&mut app).await;
            Ok(())
        }
    }
}
