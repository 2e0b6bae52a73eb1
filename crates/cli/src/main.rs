//! Fungal Flux CLI - migrations, catalog seeding, and order inspection.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ff-cli", about = "Fungal Flux operational tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the local sessions table used by the storefront.
    Migrate,
    /// Seed the remote catalog from a YAML file of products.
    Seed {
        /// Path to the YAML seed file.
        file: String,
    },
    /// Fetch and display one persisted order.
    Order {
        /// The order id (UUID).
        id: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file } => commands::seed::run(&file).await,
        Commands::Order { id } => commands::order::run(&id).await,
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "command failed");
        std::process::exit(1);
    }
}
