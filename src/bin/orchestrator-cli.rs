use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use service_orchestrator::config::{load_config, OrchestratorConfig};
use service_orchestrator::observability::logging;
use service_orchestrator::AppContext;

#[derive(Parser)]
#[command(name = "orchestrator-cli")]
#[command(about = "Inspect backend services through the orchestration layer", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one health sweep and print the performance report
    Report,
    /// Fetch the analytics dashboard aggregate
    Dashboard {
        #[arg(short, long, default_value = "30d")]
        period: String,
    },
    /// GET a backend path and print the unwrapped data
    Get { path: String },
    /// Print cache statistics
    CacheStats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => OrchestratorConfig::default(),
    };
    if let Some(url) = cli.url {
        config.transport.base_url = url;
    }
    // Keep stdout clean for JSON output
    config.observability.log_level = "warn".to_string();
    logging::init_logging(&config.observability);

    let context = AppContext::bootstrap(config).await?;

    let outcome = run(&context, cli.command).await;
    context.shutdown().await;
    outcome
}

async fn run(context: &AppContext, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Report => {
            context.registry().run_health_checks().await;
            print_json(&context.registry().get_performance_report())?;
        }
        Commands::Dashboard { period } => {
            let snapshot = context.dashboard().with_period(period).fetch().await;
            if !snapshot.is_complete() {
                eprintln!("Warning: missing sources: {}", snapshot.failed_sources().join(", "));
            }
            print_json(&snapshot)?;
        }
        Commands::Get { path } => match context.transport().get::<Value>(&path).await {
            Ok(data) => print_json(&data)?,
            Err(e) => {
                eprintln!("Error: {e}");
                if let Some(status) = e.status() {
                    eprintln!("Status: {status}");
                }
            }
        },
        Commands::CacheStats => {
            print_json(&context.cache().get_stats())?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
