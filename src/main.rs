#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use ambler::app::{App, Collaborators};
use ambler::browser::AgentBrowser;
use ambler::pacing::Pacer;
use ambler::Config;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands, RunArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = Config::load(cli.config.as_deref())?;
    match cli.command.unwrap_or_default() {
        Commands::Config => {
            println!("{}", config.to_redacted_toml()?);
            Ok(())
        }
        Commands::Run(args) => run(config, &args).await,
    }
}

async fn run(mut config: Config, args: &RunArgs) -> Result<()> {
    args.apply(&mut config);
    let credentials = config.credentials()?;

    if !AgentBrowser::new(&config.browser).is_available().await {
        tracing::warn!(
            binary = config.browser.binary.as_str(),
            "agent-browser CLI not found; browser steps will fail"
        );
    }

    let pacer = Arc::new(Pacer::new(config.pacing));
    let parts = Collaborators::from_config(&config)?;
    let app = App::new(config, parts, pacer)?;

    let outcome = app.run(&credentials).await;
    tracing::info!(
        delivered = outcome.dispatch.delivered(),
        channels = outcome.dispatch.deliveries.len(),
        "Notifications sent"
    );
    Ok(())
}
