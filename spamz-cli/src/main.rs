//! `spamz`: classify a message as spam or ham.
//!
//! ```text
//! spamz predict --subject "Claim your prize" --text "..."   # remote, with fallback
//! spamz classify --demo                                      # local heuristic only
//! spamz check                                                # which routes answer?
//! spamz probe                                                # OPTIONS reachability
//! ```

mod cli;
mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use spamz_client::probe::{check_reachability, diagnose_backend};
use spamz_client::{Resolver, Session, SpamzClient, TracingSink};
use spamz_core::classifier::classify_locally;
use spamz_core::config::LogFormat;
use spamz_core::{Resolution, SpamzConfig};

use crate::cli::{Cli, Command, MessageArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    telemetry::init(&config.general)?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Predict(args) => {
            let session = Session::new(Resolver::from_config(config.endpoint));
            let resolution = session.submit(&args.payload()).await;
            print_resolution(&resolution, &args)?;
            debug!(counters = ?session.resolver().counters().snapshot(), "Done");
        }
        Command::Classify(args) => {
            let resolution = Resolution::local(classify_locally(&args.payload()));
            print_resolution(&resolution, &args)?;
        }
        Command::Check => {
            let client = SpamzClient::new(config.endpoint);
            let report = diagnose_backend(&client, &TracingSink).await;
            print!("{}", render::render_report(&report));
            if !report.is_healthy() {
                std::process::exit(1);
            }
        }
        Command::Probe => {
            let client = SpamzClient::new(config.endpoint);
            let status = check_reachability(&client, &TracingSink).await;
            println!("{status}");
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<SpamzConfig> {
    let mut config = match &cli.config {
        Some(path) => SpamzConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => SpamzConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.endpoint.base_url.clone_from(base_url);
    }
    if cli.log_json {
        config.general.log_format = LogFormat::Json;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_resolution(resolution: &Resolution, args: &MessageArgs) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(resolution)?);
    } else {
        print!("{}", render::render(resolution));
    }
    Ok(())
}
