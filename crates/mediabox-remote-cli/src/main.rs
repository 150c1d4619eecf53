//! MediaBox remote CLI - find MediaBox players and send them remote-control
//! commands.

mod cli;
mod commands;
mod device;
mod error;
mod logging;
mod output;

use std::time::Duration;

use clap::Parser;
use mediabox_remote_core::RemoteConfig;

use cli::{Cli, Commands};
use commands::Context;
use error::{exit_codes, CliError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => RemoteConfig::load(path).await?,
        None => RemoteConfig::default(),
    };

    let ctx = Context {
        config,
        data_dir: cli.data_dir,
        timeout: Duration::from_millis(cli.timeout),
        json: cli.json,
    };

    match cli.command {
        Commands::Discover(args) => commands::run_discover(args, &ctx).await,
        Commands::Select(args) => commands::run_select(args, &ctx).await,
        Commands::Send(args) => commands::run_send(args, &ctx).await,
        Commands::Type(args) => commands::run_type(args, &ctx).await,
        Commands::Url(args) => commands::run_url(args, &ctx).await,
        Commands::Download(args) => commands::run_download(args, &ctx).await,
        Commands::Announce(args) => commands::run_announce(args, &ctx).await,
    }
}
