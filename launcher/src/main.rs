use std::sync::Arc;

use clap::Parser;
use relaunch::cli::Cli;
use relaunch::{ProcessApplication, launch};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "relaunch=info,relaunch_directory_watcher=info";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.into_config()?;
    let app = Arc::new(ProcessApplication::new(config.launch_command()?)?);
    launch(&config, app)?;

    Ok(())
}
