// ABOUTME: Entry point for the tether command-line tool
// ABOUTME: Loads .env, parses arguments, opens the SQLite store and runs one command

use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use tether_cli::logging::init_logging;
use tether_cli::{CliError, Config, TokenCommands};
use tether_storage::SqliteTokenStore;
use tether_tokens::TokenService;
use tracing::debug;

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Tether - issue and verify owner-bound tokens")]
#[command(version)]
struct Cli {
    /// Show internal error details and debug logs
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: TokenCommands,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = handle_command(&cli).await {
        let message = match e.downcast_ref::<CliError>() {
            Some(cli_error) => cli_error.user_message(cli.verbose),
            None => e.to_string(),
        };
        eprintln!("{} {}", "Error:".red().bold(), message);
        process::exit(1);
    }
}

async fn handle_command(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    debug!(
        "Opening token database at {}",
        config.storage.database_path.display()
    );
    let store = SqliteTokenStore::connect(&config.storage).await?;
    let service = TokenService::with_config(Arc::new(store), config.service.clone());

    let output = cli.command.run(&service, &config.token).await?;
    println!("{}", output);
    Ok(())
}
