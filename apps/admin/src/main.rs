use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use client_core::ClientError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod render;

use app::App;
use cli::Cli;
use crate::config::load_settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            match err.downcast_ref::<ClientError>() {
                Some(client_error) => {
                    eprintln!("error: {}", client_error.user_message());
                    let outer = err.to_string();
                    if outer != client_error.to_string() {
                        eprintln!("{outer}");
                    }
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?.apply(cli.overrides());
    init_logging(&settings.log_filter);
    debug!(api_base_url = %settings.api_base_url, "settings loaded");

    let app = App::connect(&settings).await?;
    let mut out = String::new();
    let result = app.run(cli.command, &mut out).await;
    print!("{out}");
    result
}

/// `RUST_LOG` wins over the configured filter. Logs go to stderr so command
/// output stays clean.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
