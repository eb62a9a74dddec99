use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use courier::cli::Cli;
use courier::config::{self, Config};
use courier::{commands, logging, AppContext};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env before parsing so clap's env fallbacks see it
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let file_config = match &cli.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    let transport_config = config::resolve(cli.overrides(), file_config)?;
    let transport = config::build_transport(transport_config)?;
    let cx = AppContext::new(transport);

    commands::dispatch(cli.command, &cx).await
}
