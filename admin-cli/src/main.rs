mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gameatron-admin")]
#[command(about = "Operator CLI for GameATron bot file provisioning")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a running service for a bot file
    Request {
        /// Base URL of the bot file service
        #[arg(long, default_value = "http://localhost:7071")]
        service_url: String,
        #[command(flatten)]
        target: commands::Target,
    },
    /// Provision in-process using the local configuration
    Provision {
        #[command(flatten)]
        target: commands::Target,
    },
    /// Load and validate configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gameatron_botfile=info,gameatron_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Request { service_url, target } => {
            let uri = commands::request(&service_url, &target).await?;
            println!("{}", uri);
        }
        Commands::Provision { target } => {
            let uri = commands::provision(&target).await?;
            println!("{}", uri);
        }
        Commands::CheckConfig => commands::check_config()?,
    }

    Ok(())
}
